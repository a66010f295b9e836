pub mod component;
pub mod components;
pub mod config;
pub mod error;
pub mod geometry;
pub mod index;
pub mod math;
pub mod model;
pub mod registry;
pub mod rule;

pub use error::{BeamgeomError, Result, ResultExt};
