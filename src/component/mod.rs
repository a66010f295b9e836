//! Per-component bookkeeping: placement and links, named cells and
//! surfaces, external cuts, outer envelopes and insertion, plus the
//! [`Component`] build sequence that ties them together.

mod cell_map;
mod external_cut;
mod fixed;
pub mod layers;
mod link;
mod outer;
mod surf_map;
mod zone;

pub use cell_map::CellMap;
pub use external_cut::ExternalCutSet;
pub use fixed::FixedComp;
pub use link::LinkPoint;
pub use outer::{OuterSurfaceSet, MAIN_ENVELOPE};
pub use surf_map::SurfMap;
pub use zone::ZoneBuilder;

use tracing::debug;

use crate::config::FuncDataBase;
use crate::error::{Result, ResultExt};
use crate::model::BuildContext;

/// A buildable geometry component.
///
/// Implementors hold a [`FixedComp`] plus whichever of [`CellMap`],
/// [`SurfMap`], [`ExternalCutSet`] and [`OuterSurfaceSet`] they need, and
/// fill in the build stages. [`create_all`](Self::create_all) runs the
/// stages in order and tags any failure with the component name and stage.
pub trait Component {
    fn fixed(&self) -> &FixedComp;

    fn fixed_mut(&mut self) -> &mut FixedComp;

    /// Reads the component's parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or mistyped.
    fn populate(&mut self, vars: &FuncDataBase) -> Result<()>;

    /// Places the local frame at `parent`'s link `side`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent link is unset.
    fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        self.fixed_mut().create_unit_vector(parent, side)
    }

    /// Builds surfaces into the registry.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate surface parameters.
    fn create_surfaces(&mut self, ctx: &mut BuildContext) -> Result<()>;

    /// Composes and registers cells.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule does not resolve or a cell number is taken.
    fn create_objects(&mut self, ctx: &mut BuildContext) -> Result<()>;

    /// Publishes link points.
    ///
    /// # Errors
    ///
    /// Returns an error if a link index is out of range.
    fn create_links(&mut self, ctx: &BuildContext) -> Result<()>;

    /// Cuts the component out of its host cells.
    ///
    /// # Errors
    ///
    /// Returns an error if a host cell does not exist.
    fn insert_objects(&mut self, _ctx: &mut BuildContext) -> Result<()> {
        Ok(())
    }

    /// Runs every build stage, attaching to `parent` at link `side`.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure wrapped with this component's name
    /// and the stage.
    fn create_all(&mut self, ctx: &mut BuildContext, parent: &FixedComp, side: i32) -> Result<()> {
        let name = self.fixed().name().to_owned();
        debug!(component = %name, parent = parent.name(), side, "create all");

        self.populate(ctx.vars()).in_stage(&name, "populate")?;
        self.create_unit_vector(parent, side)
            .in_stage(&name, "createUnitVector")?;
        self.fixed_mut()
            .reserve_block(ctx)
            .in_stage(&name, "createSurfaces")?;
        self.create_surfaces(ctx).in_stage(&name, "createSurfaces")?;
        self.create_objects(ctx).in_stage(&name, "createObjects")?;
        self.create_links(ctx).in_stage(&name, "createLinks")?;
        self.insert_objects(ctx).in_stage(&name, "insertObjects")?;
        Ok(())
    }
}
