use tracing::debug;

use crate::error::Result;
use crate::model::{BuildContext, Cell};
use crate::rule::HeadRule;

use super::{FixedComp, OuterSurfaceSet};

/// Carves a void region into consecutive units along a beam line.
///
/// The zone is `surround ∩ front ∩ back`. The master cell always holds the
/// part not yet handed out; each appended unit takes the slice from the
/// current front up to the unit's back, and the front advances past it.
/// The master cell keeps its number; only its rule is rewritten.
#[derive(Debug, Clone)]
pub struct ZoneBuilder {
    name: String,
    surround: HeadRule,
    front: HeadRule,
    back: HeadRule,
    material: i32,
    master: Option<i32>,
    cells: Vec<i32>,
}

impl ZoneBuilder {
    /// Creates a zone bounded by `surround` and the `front`/`back` rules.
    #[must_use]
    pub fn new(name: &str, surround: HeadRule, front: HeadRule, back: HeadRule, material: i32) -> Self {
        Self {
            name: name.to_owned(),
            surround,
            front,
            back,
            material,
            master: None,
            cells: Vec::new(),
        }
    }

    fn remaining(&self) -> HeadRule {
        self.surround.intersect(&self.front).intersect(&self.back)
    }

    /// Creates the master cell spanning the whole zone.
    ///
    /// # Errors
    ///
    /// Returns an error if `number` is already in use.
    pub fn construct_master(&mut self, ctx: &mut BuildContext, number: i32) -> Result<i32> {
        ctx.add_cell(Cell::new(number, self.material, 0.0, self.remaining()))?;
        self.master = Some(number);
        debug!(zone = %self.name, cell = number, "master cell");
        Ok(number)
    }

    /// Splits off the slice from the current front up to `back_exterior`
    /// (the region beyond the unit's back face) as cell `number`, then
    /// advances the front to `back_exterior`.
    ///
    /// # Errors
    ///
    /// Returns an error if `number` is taken or the master cell was removed.
    pub fn append_unit(&mut self, ctx: &mut BuildContext, number: i32, back_exterior: &HeadRule) -> Result<i32> {
        let slice = self
            .surround
            .intersect(&self.front)
            .intersect(&back_exterior.complement());
        ctx.add_cell(Cell::new(number, self.material, 0.0, slice))?;
        self.cells.push(number);
        self.front = back_exterior.clone();
        if let Some(master) = self.master {
            let rest = self.remaining();
            ctx.cell_mut(master)?.set_rule(rest);
        }
        debug!(zone = %self.name, cell = number, front = %self.front, "zone unit");
        Ok(number)
    }

    /// Appends a slice ending at link `side` of `fc` and inserts the
    /// component's main envelope into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is unset or the cell cannot be created.
    pub fn append_component(
        &mut self,
        ctx: &mut BuildContext,
        number: i32,
        fc: &FixedComp,
        side: i32,
        outer: &OuterSurfaceSet,
    ) -> Result<i32> {
        let back_exterior = fc.main_rule(side)?;
        self.append_unit(ctx, number, &back_exterior)?;
        outer.insert_into(ctx, number)?;
        Ok(number)
    }

    /// Master cell number, once constructed.
    #[must_use]
    pub fn master_cell(&self) -> Option<i32> {
        self.master
    }

    /// Region beyond everything appended so far.
    #[must_use]
    pub fn current_front(&self) -> &HeadRule {
        &self.front
    }

    /// Unit cells in the order they were appended.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }
}
