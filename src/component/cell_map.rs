use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{LookupError, Result};
use crate::model::{BuildContext, Cell};
use crate::rule::{Bases, HeadRule};

/// Named cells of one component.
///
/// Each name maps to an ordered list of cell numbers so that downstream
/// components can ask for "the second `Layer` cell of the shield" without
/// knowing raw numbers. Lists only grow.
#[derive(Debug, Clone, Default)]
pub struct CellMap {
    owner: String,
    cells: BTreeMap<String, Vec<i32>>,
}

impl CellMap {
    /// Creates an empty map for the named component.
    #[must_use]
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            cells: BTreeMap::new(),
        }
    }

    /// Appends a cell number under `name`.
    pub fn add_cell(&mut self, name: &str, number: i32) {
        self.cells.entry(name.to_owned()).or_default().push(number);
    }

    /// Appends several cell numbers under `name`.
    pub fn add_cells(&mut self, name: &str, numbers: &[i32]) {
        self.cells
            .entry(name.to_owned())
            .or_default()
            .extend_from_slice(numbers);
    }

    /// Creates a cell in the model and records it under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell number is already in use.
    pub fn make_cell(
        &mut self,
        ctx: &mut BuildContext,
        name: &str,
        number: i32,
        material: i32,
        temperature: f64,
        rule: HeadRule,
    ) -> Result<i32> {
        ctx.add_cell(Cell::new(number, material, temperature, rule))?;
        self.add_cell(name, number);
        Ok(number)
    }

    /// Composes `text` against `bases` and creates the cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule does not resolve or the number is taken.
    #[allow(clippy::too_many_arguments)]
    pub fn make_cell_text(
        &mut self,
        ctx: &mut BuildContext,
        bases: impl Into<Bases>,
        name: &str,
        number: i32,
        material: i32,
        temperature: f64,
        text: &str,
    ) -> Result<i32> {
        let rule = ctx.compose(bases, text)?;
        self.make_cell(ctx, name, number, material, temperature, rule)
    }

    /// Returns `true` if `name` has at least one cell.
    #[must_use]
    pub fn has_cell(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Returns the `index`-th cell registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] or [`LookupError::IndexOutOfRange`].
    pub fn get_cell(&self, name: &str, index: usize) -> Result<i32> {
        let list = self.list(name)?;
        list.get(index).copied().ok_or_else(|| {
            LookupError::IndexOutOfRange {
                owner: self.owner.clone(),
                name: name.to_owned(),
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: list.len(),
            }
            .into()
        })
    }

    /// All cells registered under `name`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] for an unknown name.
    pub fn get_cells(&self, name: &str) -> Result<Vec<i32>> {
        self.list(name).map(<[i32]>::to_vec)
    }

    /// Last cell registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] for an unknown or empty name.
    pub fn get_last_cell(&self, name: &str) -> Result<i32> {
        self.list(name)?
            .last()
            .copied()
            .ok_or_else(|| self.missing(name))
    }

    /// Every registered name, sorted.
    pub fn cell_names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Name that `number` is registered under.
    #[must_use]
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.cells
            .iter()
            .find(|(_, list)| list.contains(&number))
            .map(|(name, _)| name.as_str())
    }

    /// Registers `extra` under the same name as `existing`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::CellNotFound`] if `existing` is not in this map.
    pub fn register_extra(&mut self, existing: i32, extra: i32) -> Result<()> {
        let name = self
            .name_of(existing)
            .map(str::to_owned)
            .ok_or(LookupError::CellNotFound(existing))?;
        self.add_cell(&name, extra);
        Ok(())
    }

    /// Splits one of this component's cells along `cut`.
    ///
    /// The original keeps `-cut`, `new_number` takes `+cut`, and the new
    /// cell joins the original's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not in this map or the new number is taken.
    pub fn split_cell(
        &mut self,
        ctx: &mut BuildContext,
        number: i32,
        cut: i32,
        new_number: i32,
    ) -> Result<(i32, i32)> {
        if self.name_of(number).is_none() {
            return Err(LookupError::CellNotFound(number).into());
        }
        let pair = ctx.split_cell(number, cut, new_number)?;
        self.register_extra(number, new_number)?;
        Ok(pair)
    }

    /// Splits a cell sequentially along each `(cut, new_number)` pair.
    ///
    /// Each split acts on the piece created by the previous one, so the
    /// result is a run of slabs between consecutive cuts. Returns every
    /// resulting cell number, starting with `number`.
    ///
    /// # Errors
    ///
    /// Returns an error if any split fails.
    pub fn split_cells(
        &mut self,
        ctx: &mut BuildContext,
        number: i32,
        cuts: &[(i32, i32)],
    ) -> Result<Vec<i32>> {
        let mut out = vec![number];
        let mut current = number;
        for &(cut, new_number) in cuts {
            let (_, next) = self.split_cell(ctx, current, cut, new_number)?;
            out.push(next);
            current = next;
        }
        Ok(out)
    }

    /// Intersects every cell under `name` with `rule`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or a cell is missing from the model.
    pub fn insert_component(&self, ctx: &mut BuildContext, name: &str, rule: &HeadRule) -> Result<()> {
        for &number in self.list(name)? {
            ctx.cell_mut(number)?.add_intersection(rule);
            debug!(owner = %self.owner, name, cell = number, %rule, "cell restricted");
        }
        Ok(())
    }

    fn list(&self, name: &str) -> Result<&[i32]> {
        self.cells
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> crate::error::BeamgeomError {
        LookupError::NameNotFound {
            owner: self.owner.clone(),
            name: name.to_owned(),
        }
        .into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BeamgeomError;
    use crate::math::{Point3, Vector3};

    fn slab() -> (BuildContext, CellMap, Bases) {
        let mut ctx = BuildContext::default();
        let block = ctx.reserve("box").unwrap();
        ctx.build_plane(block.at(1), Point3::origin(), Vector3::y()).unwrap();
        ctx.build_plane(block.at(2), Point3::new(0.0, 10.0, 0.0), Vector3::y()).unwrap();
        ctx.build_plane(block.at(3), Point3::new(0.0, 5.0, 0.0), Vector3::y()).unwrap();
        ctx.build_plane(block.at(4), Point3::new(0.0, 7.0, 0.0), Vector3::y()).unwrap();
        let mut map = CellMap::new("box");
        map.make_cell_text(&mut ctx, block, "Void", 101, 0, 0.0, "1 -2").unwrap();
        (ctx, map, Bases::from(block))
    }

    #[test]
    fn lookups() {
        let (_, map, _) = slab();
        assert_eq!(map.get_cell("Void", 0).unwrap(), 101);
        assert_eq!(map.get_cells("Void").unwrap(), vec![101]);
        assert!(map.has_cell("Void"));
        assert!(matches!(
            map.get_cell("Wall", 0),
            Err(BeamgeomError::Lookup(LookupError::NameNotFound { .. }))
        ));
        assert!(matches!(
            map.get_cell("Void", 1),
            Err(BeamgeomError::Lookup(LookupError::IndexOutOfRange { index: 1, len: 1, .. }))
        ));
    }

    #[test]
    fn split_keeps_name() {
        let (mut ctx, mut map, _) = slab();
        let (a, b) = map.split_cell(&mut ctx, 101, 3, 102).unwrap();
        assert_eq!((a, b), (101, 102));
        assert_eq!(map.get_cells("Void").unwrap(), vec![101, 102]);
        assert_eq!(ctx.cell(101).unwrap().rule().display(), "1 -2 -3");
        assert_eq!(ctx.cell(102).unwrap().rule().display(), "1 -2 3");
        assert_eq!(ctx.cell(102).unwrap().material(), 0);
    }

    #[test]
    fn sequential_splits_make_slabs() {
        let (mut ctx, mut map, _) = slab();
        let cells = map.split_cells(&mut ctx, 101, &[(3, 102), (4, 103)]).unwrap();
        assert_eq!(cells, vec![101, 102, 103]);
        assert_eq!(ctx.cell(102).unwrap().rule().display(), "1 -2 3 -4");
        assert_eq!(ctx.cell(103).unwrap().rule().display(), "1 -2 3 4");
        assert_eq!(map.get_last_cell("Void").unwrap(), 103);
    }

    #[test]
    fn split_foreign_cell_fails() {
        let (mut ctx, mut map, _) = slab();
        assert!(map.split_cell(&mut ctx, 555, 3, 556).is_err());
        assert!(!ctx.has_cell(556));
    }

    #[test]
    fn insert_component_restricts_all() {
        let (mut ctx, mut map, _) = slab();
        map.split_cell(&mut ctx, 101, 3, 102).unwrap();
        map.insert_component(&mut ctx, "Void", &HeadRule::from_surf(-9)).unwrap();
        assert_eq!(ctx.cell(101).unwrap().rule().display(), "1 -2 -3 -9");
        assert_eq!(ctx.cell(102).unwrap().rule().display(), "1 -2 3 -9");
    }
}
