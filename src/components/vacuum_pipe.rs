use crate::component::{CellMap, Component, ExternalCutSet, FixedComp, OuterSurfaceSet};
use crate::config::FuncDataBase;
use crate::error::{GeometryError, Result};
use crate::model::BuildContext;
use crate::rule::HeadRule;

use super::{var, Offset};

/// A straight pipe with a wall, attached at a parent link.
///
/// When built at a non-zero link the pipe borrows its front face from that
/// link instead of building one, so it sits flush against the parent.
///
/// Local surfaces: `1` front (only when free-standing), `2` back, `7` bore,
/// `17` wall outer radius. Cells: `Void`, `Wall`. Links: `front`, `back`,
/// `outerWall`.
#[derive(Debug, Clone)]
pub struct VacuumPipe {
    fixed: FixedComp,
    cells: CellMap,
    cuts: ExternalCutSet,
    outer: OuterSurfaceSet,
    offset: Offset,
    length: f64,
    radius: f64,
    wall_thick: f64,
    void_mat: i32,
    wall_mat: i32,
}

impl VacuumPipe {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, 3),
            cells: CellMap::new(name),
            cuts: ExternalCutSet::new(name),
            outer: OuterSurfaceSet::new(name),
            offset: Offset::default(),
            length: 0.0,
            radius: 0.0,
            wall_thick: 0.0,
            void_mat: 0,
            wall_mat: 0,
        }
    }

    #[must_use]
    pub fn cells(&self) -> &CellMap {
        &self.cells
    }

    #[must_use]
    pub fn outer(&self) -> &OuterSurfaceSet {
        &self.outer
    }

    #[must_use]
    pub fn cuts(&self) -> &ExternalCutSet {
        &self.cuts
    }

    /// Requests insertion into a host cell during `insertObjects`.
    pub fn add_insert_cell(&mut self, host: i32) {
        self.outer.add_insert_cell(host);
    }

    /// Requests insertion into every cell of another component's named group.
    ///
    /// # Errors
    ///
    /// Returns an error if the group name is unknown.
    pub fn add_insert_group(&mut self, host: &CellMap, name: &str) -> Result<()> {
        self.outer.add_insert_cells(&host.get_cells(name)?);
        Ok(())
    }

    /// Overrides the back face with an external rule (the region the pipe
    /// may occupy), e.g. the entrance of the next component.
    pub fn set_back(&mut self, rule: HeadRule) {
        self.cuts.set_cut_surf("back", rule);
    }
}

impl Component for VacuumPipe {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self) -> &mut FixedComp {
        &mut self.fixed
    }

    fn populate(&mut self, vars: &FuncDataBase) -> Result<()> {
        let name = self.fixed.name().to_owned();
        self.offset = Offset::populate(vars, &name);
        self.length = var(vars, &name, "Length")?;
        self.radius = var(vars, &name, "Radius")?;
        self.wall_thick = var(vars, &name, "WallThick")?;
        if self.wall_thick <= 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "WallThick",
                value: self.wall_thick,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        let void_key = format!("{name}VoidMat");
        self.void_mat = if vars.has_variable(&void_key) {
            vars.eval_mat(&void_key)?
        } else {
            0
        };
        self.wall_mat = vars.eval_mat(&format!("{name}WallMat"))?;
        Ok(())
    }

    fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        self.fixed.create_unit_vector(parent, side)?;
        self.offset.apply(self.fixed.frame_mut());
        if side != 0 {
            self.cuts.set_cut_from_link("front", parent, side)?;
        }
        Ok(())
    }

    fn create_surfaces(&mut self, ctx: &mut BuildContext) -> Result<()> {
        let frame = self.fixed.frame().clone();
        let (origin, y) = (*frame.origin(), *frame.y());
        if !self.cuts.has_cut("front") {
            let front = ctx.build_plane(self.fixed.surf(1)?, origin, y)?;
            self.cuts.set_cut_surf("front", HeadRule::from_surf(front));
        }
        if !self.cuts.has_cut("back") {
            let back = ctx.build_plane(self.fixed.surf(2)?, origin + y * self.length, y)?;
            self.cuts.set_cut_surf("back", HeadRule::from_surf(-back));
        }
        ctx.build_cylinder(self.fixed.surf(7)?, origin, y, self.radius)?;
        ctx.build_cylinder(self.fixed.surf(17)?, origin, y, self.radius + self.wall_thick)?;
        Ok(())
    }

    fn create_objects(&mut self, ctx: &mut BuildContext) -> Result<()> {
        let block = self.fixed.block()?;
        let ends = self.cuts.rule("front")?.intersect(&self.cuts.rule("back")?);

        let void = ends.intersect(&ctx.compose(block, "-7")?);
        let number = self.fixed.next_cell()?;
        self.cells.make_cell(ctx, "Void", number, self.void_mat, 0.0, void)?;

        let wall = ends.intersect(&ctx.compose(block, "7 -17")?);
        let number = self.fixed.next_cell()?;
        self.cells.make_cell(ctx, "Wall", number, self.wall_mat, 0.0, wall)?;

        self.outer
            .add_outer_surf(&ends.intersect(&ctx.compose(block, "-17")?));
        Ok(())
    }

    fn create_links(&mut self, ctx: &BuildContext) -> Result<()> {
        let block = self.fixed.block()?;
        let frame = self.fixed.frame().clone();
        let (origin, y, z) = (*frame.origin(), *frame.y(), *frame.z());
        let bore = ctx.compose(block, "-17")?;

        self.fixed.set_connect(1, origin, -y)?;
        self.fixed
            .set_link_surf(1, self.cuts.complement_rule("front")?)?;
        self.fixed.set_bridge_surf(1, bore.clone())?;
        self.fixed.name_side_index(1, "front")?;

        self.fixed.set_connect(2, origin + y * self.length, y)?;
        self.fixed
            .set_link_surf(2, self.cuts.complement_rule("back")?)?;
        self.fixed.set_bridge_surf(2, bore)?;
        self.fixed.name_side_index(2, "back")?;

        let rim = origin + y * (self.length / 2.0) + z * (self.radius + self.wall_thick);
        self.fixed.set_connect(3, rim, z)?;
        self.fixed.set_link_surf(3, ctx.compose(block, "17")?)?;
        self.fixed.name_side_index(3, "outerWall")?;
        Ok(())
    }

    fn insert_objects(&mut self, ctx: &mut BuildContext) -> Result<()> {
        self.outer.insert_objects(ctx)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{BeamgeomError, LookupError};
    use crate::math::{Point3, Vector3};

    fn vars() -> FuncDataBase {
        let mut vars = FuncDataBase::new();
        vars.add_material("Aluminium", 5);
        vars.add_variable("pipeALength", 50.0);
        vars.add_variable("pipeARadius", 3.0);
        vars.add_variable("pipeAWallThick", 0.5);
        vars.add_variable("pipeAWallMat", "Aluminium");
        vars
    }

    fn parent() -> FixedComp {
        let mut fc = FixedComp::new("stand", 2);
        fc.set_connect(2, Point3::new(0.0, 20.0, 0.0), Vector3::y())
            .unwrap();
        fc
    }

    #[test]
    fn free_standing_pipe() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let mut pipe = VacuumPipe::new("pipeA");
        pipe.create_all(&mut ctx, &FixedComp::new("World", 0), 0)
            .unwrap();
        let void = pipe.cells().get_cell("Void", 0).unwrap();
        assert_eq!(ctx.cell(void).unwrap().rule().display(), "1 -2 -3");
        let wall = pipe.cells().get_cell("Wall", 0).unwrap();
        assert_eq!(ctx.cell(wall).unwrap().rule().display(), "1 -2 3 -4");
        assert_eq!(ctx.cell(wall).unwrap().material(), 5);
        assert_eq!(pipe.fixed().main_rule(1).unwrap().display(), "-1");
        assert_eq!(pipe.fixed().full_rule(2).unwrap().display(), "2 -4");
    }

    #[test]
    fn front_is_cut_by_parent_link() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let mut stand = parent();
        let block = ctx.reserve("stand").unwrap();
        let exit = ctx
            .build_plane(block.at(2), Point3::new(0.0, 20.0, 0.0), Vector3::y())
            .unwrap();
        stand.set_link_surf_id(2, exit).unwrap();

        let mut pipe = VacuumPipe::new("pipeA");
        pipe.create_all(&mut ctx, &stand, 2).unwrap();
        assert!(ctx.surfaces().realise(pipe.fixed().surf(1).unwrap()).is_none());
        let void = pipe.cells().get_cell("Void", 0).unwrap();
        assert_eq!(ctx.cell(void).unwrap().rule().display(), "1 -2 -3");
        assert_eq!(pipe.fixed().link_pt(2).unwrap(), Point3::new(0.0, 70.0, 0.0));
    }

    #[test]
    fn unset_parent_link_names_the_stage() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let mut pipe = VacuumPipe::new("pipeA");
        let err = pipe.create_all(&mut ctx, &parent(), 2).unwrap_err();
        assert_eq!(err.breadcrumbs(), vec![("pipeA", "createUnitVector")]);
        assert!(matches!(
            err.root_cause(),
            BeamgeomError::Lookup(LookupError::LinkNotSet { index: 2, .. })
        ));
    }

    #[test]
    fn missing_host() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let mut pipe = VacuumPipe::new("pipeA");
        pipe.add_insert_cell(99_999);
        let err = pipe
            .create_all(&mut ctx, &FixedComp::new("World", 0), 0)
            .unwrap_err();
        assert_eq!(err.breadcrumbs(), vec![("pipeA", "insertObjects")]);
        assert!(matches!(
            err.root_cause(),
            BeamgeomError::Lookup(LookupError::HostCellNotFound(99_999))
        ));
    }
}
