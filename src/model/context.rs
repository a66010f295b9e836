use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::{BuildConfig, FuncDataBase};
use crate::error::{LookupError, Result};
use crate::geometry::ConeSheet;
use crate::index::{IndexAllocator, IndexBlock};
use crate::math::{Point3, Vector3};
use crate::registry::SurfaceRegistry;
use crate::rule::{compose, Bases, HeadRule};

use super::Cell;

/// All shared state of one model build.
///
/// One context is created per model (or per test) and passed by `&mut` to
/// every component stage. Construction is single-threaded and sequential:
/// the surface registry and the index counter have no locking.
#[derive(Debug)]
pub struct BuildContext {
    config: BuildConfig,
    vars: FuncDataBase,
    surfaces: SurfaceRegistry,
    index: IndexAllocator,
    cells: BTreeMap<i32, Cell>,
    outer_boundary: HeadRule,
    world_cell: Option<i32>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(BuildConfig::default(), FuncDataBase::new())
    }
}

impl BuildContext {
    /// Starts a model build.
    #[must_use]
    pub fn new(config: BuildConfig, vars: FuncDataBase) -> Self {
        Self {
            surfaces: SurfaceRegistry::new(config.first_surface, config.tolerance),
            index: IndexAllocator::new(config.first_index, config.stride),
            config,
            vars,
            cells: BTreeMap::new(),
            outer_boundary: HeadRule::new(),
            world_cell: None,
        }
    }

    /// Returns the build settings.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Returns the variable store.
    #[must_use]
    pub fn vars(&self) -> &FuncDataBase {
        &self.vars
    }

    /// Returns the variable store for editing.
    pub fn vars_mut(&mut self) -> &mut FuncDataBase {
        &mut self.vars
    }

    /// Returns the surface registry.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    /// Returns the index allocator and object groups.
    #[must_use]
    pub fn index(&self) -> &IndexAllocator {
        &self.index
    }

    /// Reserves an index block for a component.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered.
    pub fn reserve(&mut self, name: &str) -> Result<IndexBlock> {
        self.index.reserve(name)
    }

    fn check_logical(&self, logical: i32) {
        if self.index.owner_of(logical).is_none() {
            warn!(logical, "surface registered outside every reserved index block");
        }
    }

    /// Builds a plane at a logical number. See [`SurfaceRegistry::build_plane`].
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-length normal.
    pub fn build_plane(&mut self, logical: i32, point: Point3, normal: Vector3) -> Result<i32> {
        self.check_logical(logical);
        self.surfaces.build_plane(logical, point, normal)
    }

    /// Builds a plane parallel to `reference`, moved `shift` along its signed normal.
    ///
    /// # Errors
    ///
    /// Returns an error if `reference` is not a plane.
    pub fn build_shifted_plane(&mut self, logical: i32, reference: i32, shift: f64) -> Result<i32> {
        self.check_logical(logical);
        self.surfaces.build_shifted_plane(logical, reference, shift)
    }

    /// Builds a cylinder at a logical number.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero axis or non-positive radius.
    pub fn build_cylinder(
        &mut self,
        logical: i32,
        centre: Point3,
        axis: Vector3,
        radius: f64,
    ) -> Result<i32> {
        self.check_logical(logical);
        self.surfaces.build_cylinder(logical, centre, axis, radius)
    }

    /// Builds a cone at a logical number; `half_angle` in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero axis or an angle outside `(0, 90)`.
    pub fn build_cone(
        &mut self,
        logical: i32,
        apex: Point3,
        axis: Vector3,
        half_angle: f64,
        sheet: ConeSheet,
    ) -> Result<i32> {
        self.check_logical(logical);
        self.surfaces.build_cone(logical, apex, axis, half_angle, sheet)
    }

    /// Builds a sphere at a logical number.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius.
    pub fn build_sphere(&mut self, logical: i32, centre: Point3, radius: f64) -> Result<i32> {
        self.check_logical(logical);
        self.surfaces.build_sphere(logical, centre, radius)
    }

    /// Composes rule text against the given bases.
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn compose(&self, bases: impl Into<Bases>, text: &str) -> Result<HeadRule> {
        compose(&self.surfaces, &bases.into(), text)
    }

    /// Adds a cell to the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell number is taken.
    pub fn add_cell(&mut self, cell: Cell) -> Result<()> {
        let number = cell.number();
        if self.cells.contains_key(&number) {
            return Err(LookupError::DuplicateCell(number).into());
        }
        debug!(cell = number, material = cell.material(), rule = %cell.rule(), "add cell");
        self.cells.insert(number, cell);
        Ok(())
    }

    /// Returns `true` if the cell exists.
    #[must_use]
    pub fn has_cell(&self, number: i32) -> bool {
        self.cells.contains_key(&number)
    }

    /// Returns a cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell does not exist.
    pub fn cell(&self, number: i32) -> Result<&Cell> {
        self.cells
            .get(&number)
            .ok_or_else(|| LookupError::CellNotFound(number).into())
    }

    /// Returns a cell for editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell does not exist.
    pub fn cell_mut(&mut self, number: i32) -> Result<&mut Cell> {
        self.cells
            .get_mut(&number)
            .ok_or_else(|| LookupError::CellNotFound(number).into())
    }

    /// Removes a cell from the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell does not exist.
    pub fn remove_cell(&mut self, number: i32) -> Result<Cell> {
        self.cells
            .remove(&number)
            .ok_or_else(|| LookupError::CellNotFound(number).into())
    }

    /// Iterates over cells in number order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Splits a cell along a surface.
    ///
    /// The original keeps its number and gains `-cut`; the new cell takes
    /// the original boundary plus `+cut`, with the same material,
    /// temperature and density.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is missing or `new_number` is taken.
    pub fn split_cell(&mut self, number: i32, cut: i32, new_number: i32) -> Result<(i32, i32)> {
        if self.cells.contains_key(&new_number) {
            return Err(LookupError::DuplicateCell(new_number).into());
        }
        let cell = self.cell_mut(number)?;
        let positive = cell.rule().intersect(&HeadRule::from_surf(cut));
        let new_cell = cell.split_off(new_number, positive);
        cell.add_intersection(&HeadRule::from_surf(-cut));
        debug!(cell = number, new_cell = new_number, cut, "split cell");
        self.cells.insert(new_number, new_cell);
        Ok((number, new_number))
    }

    /// Subtracts `exclusion` from a host cell once per `tag`.
    ///
    /// Returns `false` if the same tag was already applied to that host.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::HostCellNotFound`] if the host does not exist.
    pub fn insert_into(&mut self, host: i32, tag: &str, exclusion: &HeadRule) -> Result<bool> {
        let cell = self
            .cells
            .get_mut(&host)
            .ok_or(LookupError::HostCellNotFound(host))?;
        let applied = cell.exclude(tag, exclusion);
        if applied {
            debug!(host, tag, "inserted object");
        }
        Ok(applied)
    }

    /// Name of the component whose index block holds `cell`.
    #[must_use]
    pub fn find_group_of_cell(&self, cell: i32) -> Option<&str> {
        self.index.owner_of(cell)
    }

    /// Creates the world sphere and the void cell inside it.
    ///
    /// Returns the world void cell number; top-level components insert into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the world was already created.
    pub fn create_world(&mut self) -> Result<i32> {
        let block = self.reserve("World")?;
        let sphere = self.build_sphere(block.at(1), Point3::origin(), self.config.world_radius)?;
        self.outer_boundary = HeadRule::from_surf(-sphere);
        let number = block.at(1);
        self.add_cell(Cell::new(number, 0, 0.0, self.outer_boundary.clone()))?;
        self.world_cell = Some(number);
        Ok(number)
    }

    /// Returns the world boundary (empty until [`create_world`](Self::create_world)).
    #[must_use]
    pub fn outer_boundary(&self) -> &HeadRule {
        &self.outer_boundary
    }

    /// Returns the world void cell number, if created.
    #[must_use]
    pub fn world_cell(&self) -> Option<i32> {
        self.world_cell
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BeamgeomError;

    #[test]
    fn end_to_end_numbering() {
        let mut ctx = BuildContext::default();
        let a = ctx.reserve("A").unwrap();
        assert_eq!(a.base(), 100);
        let plane = ctx.build_plane(a.at(1), Point3::origin(), Vector3::y()).unwrap();
        let cyl = ctx.build_cylinder(a.at(2), Point3::origin(), Vector3::y(), 5.0).unwrap();
        assert_eq!((plane, cyl), (1, 2));
        assert_eq!(ctx.compose(a, "1 -2").unwrap().display(), "1 -2");

        let b = ctx.reserve("B").unwrap();
        assert_eq!(b.base(), 10_100);
        let moved = ctx
            .build_plane(b.at(1), Point3::new(0.0, 30.0, 0.0), Vector3::y())
            .unwrap();
        assert_eq!(moved, 3);
        assert_eq!(ctx.compose(b, "1").unwrap().display(), "3");
    }

    #[test]
    fn duplicate_cell_rejected() {
        let mut ctx = BuildContext::default();
        ctx.add_cell(Cell::new(5, 0, 0.0, HeadRule::new())).unwrap();
        assert!(matches!(
            ctx.add_cell(Cell::new(5, 0, 0.0, HeadRule::new())),
            Err(BeamgeomError::Lookup(LookupError::DuplicateCell(5)))
        ));
    }

    #[test]
    fn split_divides_rule() {
        let mut ctx = BuildContext::default();
        ctx.add_cell(Cell::new(101, 4, 20.0, HeadRule::parse("1 -2").unwrap()))
            .unwrap();
        let (a, b) = ctx.split_cell(101, 7, 102).unwrap();
        assert_eq!((a, b), (101, 102));
        assert_eq!(ctx.cell(101).unwrap().rule().display(), "1 -2 -7");
        assert_eq!(ctx.cell(102).unwrap().rule().display(), "1 -2 7");
        assert_eq!(ctx.cell(102).unwrap().material(), 4);
        assert!(ctx.split_cell(101, 8, 102).is_err());
        assert!(ctx.split_cell(999, 8, 103).is_err());
    }

    #[test]
    fn missing_host_cell() {
        let mut ctx = BuildContext::default();
        let err = ctx.insert_into(99_999, "pipe:Main", &HeadRule::from_surf(3)).unwrap_err();
        assert!(matches!(
            err,
            BeamgeomError::Lookup(LookupError::HostCellNotFound(99_999))
        ));
    }

    #[test]
    fn world_creation() {
        let mut ctx = BuildContext::default();
        let cell = ctx.create_world().unwrap();
        assert_eq!(cell, 101);
        assert_eq!(ctx.outer_boundary().display(), "-1");
        assert_eq!(ctx.world_cell(), Some(101));
        assert_eq!(ctx.find_group_of_cell(101), Some("World"));
        assert!(ctx.create_world().is_err());
    }

    #[test]
    fn cells_iterate_in_order() {
        let mut ctx = BuildContext::default();
        for n in [30, 10, 20] {
            ctx.add_cell(Cell::new(n, 0, 0.0, HeadRule::new())).unwrap();
        }
        let order: Vec<i32> = ctx.cells().map(Cell::number).collect();
        assert_eq!(order, vec![10, 20, 30]);
        ctx.remove_cell(20).unwrap();
        assert!(!ctx.has_cell(20));
    }
}
