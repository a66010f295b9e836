use tracing::debug;

use crate::error::{LookupError, Result};
use crate::index::IndexBlock;
use crate::math::{Frame, Point3, Vector3};
use crate::model::BuildContext;
use crate::rule::{Bases, HeadRule};

use super::link::LinkPoint;

/// Placement, numbering and link points of one component instance.
///
/// Link indices are signed: `0` is the origin, `k` is link `k` and `-k`
/// is link `k` seen from the other side (reversed axis, complemented rule).
#[derive(Debug, Clone)]
pub struct FixedComp {
    name: String,
    block: Option<IndexBlock>,
    cell_index: i32,
    frame: Frame,
    links: Vec<LinkPoint>,
}

impl FixedComp {
    /// Creates a component with `n_links` empty link slots.
    #[must_use]
    pub fn new(name: &str, n_links: usize) -> Self {
        Self {
            name: name.to_owned(),
            block: None,
            cell_index: 0,
            frame: Frame::default(),
            links: vec![LinkPoint::default(); n_links],
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the local frame.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Returns the local frame for adjustment.
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// Replaces the local frame.
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    /// Reserves this component's index block, once.
    ///
    /// Cell numbering restarts at `base + 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if another component already took this name.
    pub fn reserve_block(&mut self, ctx: &mut BuildContext) -> Result<IndexBlock> {
        if let Some(block) = self.block {
            return Ok(block);
        }
        let block = ctx.reserve(&self.name)?;
        self.block = Some(block);
        self.cell_index = block.at(1);
        Ok(block)
    }

    /// Returns the reserved index block.
    ///
    /// # Errors
    ///
    /// Returns an error if [`reserve_block`](Self::reserve_block) was not called.
    pub fn block(&self) -> Result<IndexBlock> {
        self.block.ok_or_else(|| {
            LookupError::NameNotFound {
                owner: self.name.clone(),
                name: "index block".into(),
            }
            .into()
        })
    }

    /// Logical number of a local offset.
    ///
    /// # Errors
    ///
    /// Returns an error if no block is reserved.
    pub fn surf(&self, offset: i32) -> Result<i32> {
        Ok(self.block()?.at(offset))
    }

    /// Primary composition base.
    ///
    /// # Errors
    ///
    /// Returns an error if no block is reserved.
    pub fn bases(&self) -> Result<Bases> {
        Ok(Bases::new(self.block()?.base()))
    }

    /// Hands out the next cell number from this component's block.
    ///
    /// # Errors
    ///
    /// Returns an error if no block is reserved.
    pub fn next_cell(&mut self) -> Result<i32> {
        self.block()?;
        let number = self.cell_index;
        self.cell_index += 1;
        Ok(number)
    }

    /// Places the frame at `parent`'s link `side`: origin at the link
    /// point, `y` along the link axis, `z` kept close to the parent's `z`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent link is unset.
    pub fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        let point = parent.link_pt(side)?;
        let axis = parent.link_axis(side)?;
        self.frame = Frame::from_link(point, axis, parent.frame().z())?;
        debug!(component = %self.name, parent = parent.name(), side, "placed");
        Ok(())
    }

    /// Number of link slots.
    #[must_use]
    pub fn n_links(&self) -> usize {
        self.links.len()
    }

    /// Resizes the link table, keeping existing links.
    pub fn set_n_links(&mut self, n_links: usize) {
        self.links.resize(n_links, LinkPoint::default());
    }

    fn slot(&self, side: i32) -> Result<&LinkPoint> {
        let index = usize::try_from(side.unsigned_abs()).unwrap_or(usize::MAX);
        index
            .checked_sub(1)
            .and_then(|i| self.links.get(i))
            .ok_or_else(|| self.out_of_range(side))
    }

    fn slot_mut(&mut self, k: usize) -> Result<&mut LinkPoint> {
        let err = self.out_of_range(i32::try_from(k).unwrap_or(i32::MAX));
        k.checked_sub(1)
            .and_then(|i| self.links.get_mut(i))
            .ok_or(err)
    }

    fn out_of_range(&self, side: i32) -> crate::error::BeamgeomError {
        LookupError::IndexOutOfRange {
            owner: self.name.clone(),
            name: "link".into(),
            index: i64::from(side),
            len: self.links.len(),
        }
        .into()
    }

    fn not_set(&self, side: i32) -> crate::error::BeamgeomError {
        LookupError::LinkNotSet {
            owner: self.name.clone(),
            index: side,
        }
        .into()
    }

    /// Sets the anchor point and direction of link `k` (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn set_connect(&mut self, k: usize, point: Point3, axis: Vector3) -> Result<()> {
        let axis = axis.try_normalize(0.0).unwrap_or(axis);
        self.slot_mut(k)?.set_connect(point, axis);
        Ok(())
    }

    /// Sets the main rule of link `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn set_link_surf(&mut self, k: usize, rule: HeadRule) -> Result<()> {
        self.slot_mut(k)?.set_main(rule);
        Ok(())
    }

    /// Sets the main rule of link `k` to one signed surface.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn set_link_surf_id(&mut self, k: usize, signed: i32) -> Result<()> {
        self.set_link_surf(k, HeadRule::from_surf(signed))
    }

    /// Intersects an extra condition into the main rule of link `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn add_link_surf(&mut self, k: usize, rule: &HeadRule) -> Result<()> {
        self.slot_mut(k)?.add_main(rule);
        Ok(())
    }

    /// Sets the common (bridging) rule of link `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn set_bridge_surf(&mut self, k: usize, rule: HeadRule) -> Result<()> {
        self.slot_mut(k)?.set_common(rule);
        Ok(())
    }

    /// Names link `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn name_side_index(&mut self, k: usize, name: &str) -> Result<()> {
        self.slot_mut(k)?.set_name(name);
        Ok(())
    }

    /// Copies link `other_side` of another component into link `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range or the source link is unset.
    pub fn copy_link(&mut self, k: usize, other: &FixedComp, other_side: i32) -> Result<()> {
        let point = other.link_pt(other_side)?;
        let axis = other.link_axis(other_side)?;
        let main = other.main_rule(other_side)?;
        let common = other.common_rule(other_side)?;
        let slot = self.slot_mut(k)?;
        slot.set_connect(point, axis);
        slot.set_main(main);
        slot.set_common(common);
        Ok(())
    }

    /// Resolves a link name to its signed index. A leading `-` or `#`
    /// reverses it; a plain run of digits is accepted as an index. Only one
    /// sign is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if no link carries the name.
    pub fn find_link(&self, name: &str) -> Result<i32> {
        let (sign, bare) = match name.strip_prefix(['-', '#']) {
            Some(rest) => (-1, rest),
            None => (1, name),
        };
        if !bare.is_empty() && bare.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = bare.parse::<i32>() {
                return Ok(sign * index);
            }
        }
        if bare == "Origin" {
            return Ok(0);
        }
        self.links
            .iter()
            .position(|l| l.name() == Some(bare))
            .and_then(|i| i32::try_from(i + 1).ok())
            .map(|i| sign * i)
            .ok_or_else(|| {
                LookupError::NameNotFound {
                    owner: self.name.clone(),
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// Anchor point of link `side`; `0` is the frame origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range or unset.
    pub fn link_pt(&self, side: i32) -> Result<Point3> {
        if side == 0 {
            return Ok(*self.frame.origin());
        }
        let slot = self.slot(side)?;
        slot.connect().map(|(p, _)| *p).ok_or_else(|| self.not_set(side))
    }

    /// Direction of link `side`; negative indices reverse it and `0` is
    /// the frame's `y` axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range or unset.
    pub fn link_axis(&self, side: i32) -> Result<Vector3> {
        if side == 0 {
            return Ok(*self.frame.y());
        }
        let slot = self.slot(side)?;
        let (_, axis) = slot.connect().ok_or_else(|| self.not_set(side))?;
        Ok(if side < 0 { -axis } else { *axis })
    }

    /// Main rule of link `side`; negative indices complement it and `0`
    /// gives the empty rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range or its rule is unset.
    pub fn main_rule(&self, side: i32) -> Result<HeadRule> {
        if side == 0 {
            return Ok(HeadRule::new());
        }
        let slot = self.slot(side)?;
        let main = slot.main().ok_or_else(|| self.not_set(side))?;
        Ok(if side < 0 { main.complement() } else { main.clone() })
    }

    /// Common rule of link `side` (same for both directions).
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range.
    pub fn common_rule(&self, side: i32) -> Result<HeadRule> {
        if side == 0 {
            return Ok(HeadRule::new());
        }
        Ok(self.slot(side)?.common().clone())
    }

    /// Main rule intersected with the common rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range or unset.
    pub fn full_rule(&self, side: i32) -> Result<HeadRule> {
        Ok(self.main_rule(side)?.intersect(&self.common_rule(side)?))
    }

    /// First signed surface of the main rule of link `side`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is unset or its rule is empty.
    pub fn link_surf(&self, side: i32) -> Result<i32> {
        self.main_rule(side)?
            .surfaces()
            .first()
            .copied()
            .ok_or_else(|| self.not_set(side))
    }

    /// Direct access to link `k` (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range.
    pub fn link(&self, k: usize) -> Result<&LinkPoint> {
        self.slot(i32::try_from(k).unwrap_or(i32::MAX))
    }
}
