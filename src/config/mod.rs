mod vars;

pub use vars::{FromVar, FuncDataBase, VarValue};

/// Numbering and tolerance settings for one model build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Base of the first reserved index block.
    pub first_index: i32,
    /// Width of each index block.
    pub stride: i32,
    /// First number handed out by the surface registry.
    pub first_surface: i32,
    /// Distance/direction tolerance for surface de-duplication.
    pub tolerance: f64,
    /// Radius of the world sphere bounding the model.
    pub world_radius: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            first_index: 100,
            stride: 10_000,
            first_surface: 1,
            tolerance: 1e-6,
            world_radius: 10_000.0,
        }
    }
}
