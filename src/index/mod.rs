//! Per-component numbering blocks.
//!
//! Each component instance reserves a contiguous block of logical numbers
//! from a single increasing counter. Its surfaces live at `base + offset`
//! and its cells are numbered from `base + 1`. Blocks are never reused.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{LookupError, Result};

slotmap::new_key_type! {
    /// Handle for a reserved object group.
    pub struct GroupId;
}

/// A reserved block `[base, base + extent)` of logical numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBlock {
    base: i32,
    extent: i32,
}

impl IndexBlock {
    /// Returns the first number of the block.
    #[must_use]
    pub fn base(&self) -> i32 {
        self.base
    }

    /// Returns the number of logical numbers held by the block.
    #[must_use]
    pub fn extent(&self) -> i32 {
        self.extent
    }

    /// Absolute logical number of a local offset.
    #[must_use]
    pub fn at(&self, offset: i32) -> i32 {
        self.base + offset
    }

    /// Returns `true` if `number` falls inside this block.
    #[must_use]
    pub fn contains(&self, number: i32) -> bool {
        number >= self.base && number < self.base + self.extent
    }

    /// Returns `true` if the two blocks share any number.
    #[must_use]
    pub fn overlaps(&self, other: &IndexBlock) -> bool {
        self.base < other.base + other.extent && other.base < self.base + self.extent
    }
}

/// A named reservation.
#[derive(Debug, Clone)]
pub struct GroupData {
    /// Component name the block was reserved for.
    pub name: String,
    /// The reserved block.
    pub block: IndexBlock,
}

/// Hands out non-overlapping index blocks and remembers who owns them.
#[derive(Debug)]
pub struct IndexAllocator {
    next: i32,
    stride: i32,
    groups: slotmap::SlotMap<GroupId, GroupData>,
    by_name: HashMap<String, GroupId>,
    ordered: Vec<GroupId>,
}

impl Default for IndexAllocator {
    fn default() -> Self {
        Self::new(100, 10_000)
    }
}

impl IndexAllocator {
    /// Creates an allocator whose first block starts at `first` and whose
    /// blocks are `stride` numbers wide.
    #[must_use]
    pub fn new(first: i32, stride: i32) -> Self {
        Self {
            next: first,
            stride: stride.max(1),
            groups: slotmap::SlotMap::with_key(),
            by_name: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// Returns the standard block width.
    #[must_use]
    pub fn stride(&self) -> i32 {
        self.stride
    }

    /// Reserves one stride-wide block for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` already holds a block.
    pub fn reserve(&mut self, name: &str) -> Result<IndexBlock> {
        self.reserve_sized(name, self.stride)
    }

    /// Reserves a block of at least `extent` numbers, rounded up to whole
    /// strides so later bases stay stride-aligned.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` already holds a block or the block would run
    /// past `i32::MAX`.
    pub fn reserve_sized(&mut self, name: &str, extent: i32) -> Result<IndexBlock> {
        if self.by_name.contains_key(name) {
            return Err(LookupError::DuplicateComponent(name.to_owned()).into());
        }
        let exhausted = || LookupError::AllocatorExhausted(name.to_owned());
        let strides = (extent.max(1) - 1) / self.stride + 1;
        let extent = strides.checked_mul(self.stride).ok_or_else(exhausted)?;
        let end = self.next.checked_add(extent).ok_or_else(exhausted)?;
        let block = IndexBlock {
            base: self.next,
            extent,
        };
        self.next = end;

        let id = self.groups.insert(GroupData {
            name: name.to_owned(),
            block,
        });
        self.by_name.insert(name.to_owned(), id);
        self.ordered.push(id);
        debug!(component = name, base = block.base, extent = block.extent, "reserved index block");
        Ok(block)
    }

    /// Returns the block reserved for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no block was reserved under that name.
    pub fn block(&self, name: &str) -> Result<IndexBlock> {
        self.by_name
            .get(name)
            .and_then(|&id| self.groups.get(id))
            .map(|g| g.block)
            .ok_or_else(|| {
                LookupError::NameNotFound {
                    owner: "object groups".into(),
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// Looks up a reservation by handle.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&GroupData> {
        self.groups.get(id)
    }

    /// Returns the name of the component whose block holds `number`.
    #[must_use]
    pub fn owner_of(&self, number: i32) -> Option<&str> {
        let idx = self
            .ordered
            .partition_point(|&id| self.groups[id].block.base <= number);
        let id = *self.ordered.get(idx.checked_sub(1)?)?;
        let group = &self.groups[id];
        group.block.contains(number).then_some(group.name.as_str())
    }

    /// Iterates over reservations in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupData> {
        self.ordered.iter().map(|&id| &self.groups[id])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn consecutive_blocks() {
        let mut alloc = IndexAllocator::default();
        let a = alloc.reserve("A").unwrap();
        let b = alloc.reserve("B").unwrap();
        assert_eq!(a.base(), 100);
        assert_eq!(b.base(), 10_100);
        assert_eq!(a.at(4), 104);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut alloc = IndexAllocator::default();
        alloc.reserve("bunker").unwrap();
        assert!(alloc.reserve("bunker").is_err());
    }

    #[test]
    fn sized_blocks_round_to_stride() {
        let mut alloc = IndexAllocator::new(1000, 100);
        let big = alloc.reserve_sized("big", 250).unwrap();
        let next = alloc.reserve("next").unwrap();
        assert_eq!(big.extent(), 300);
        assert_eq!(next.base(), 1300);
    }

    #[test]
    fn exhausted_range_is_an_error() {
        let mut alloc = IndexAllocator::new(100, 1_000_000_000);
        alloc.reserve("A").unwrap();
        alloc.reserve("B").unwrap();
        let err = alloc.reserve("C").unwrap_err();
        assert!(err.to_string().contains("exhausted"));
        assert!(alloc.block("C").is_err());
        assert!(IndexAllocator::default().reserve_sized("huge", i32::MAX).is_err());
    }

    #[test]
    fn owner_lookup() {
        let mut alloc = IndexAllocator::default();
        alloc.reserve("A").unwrap();
        alloc.reserve("B").unwrap();
        assert_eq!(alloc.owner_of(10_150), Some("B"));
        assert_eq!(alloc.owner_of(100), Some("A"));
        assert_eq!(alloc.owner_of(99), None);
        assert_eq!(alloc.owner_of(20_100), None);
        assert_eq!(alloc.block("B").unwrap().base(), 10_100);
        assert!(alloc.block("C").is_err());
    }

    proptest! {
        #[test]
        fn blocks_never_overlap(extents in prop::collection::vec(1i32..30_000, 1..40)) {
            let mut alloc = IndexAllocator::default();
            let blocks: Vec<IndexBlock> = extents
                .iter()
                .enumerate()
                .map(|(i, &e)| alloc.reserve_sized(&format!("c{i}"), e).unwrap())
                .collect();
            for (i, a) in blocks.iter().enumerate() {
                for b in &blocks[i + 1..] {
                    prop_assert!(!a.overlaps(b));
                    prop_assert!(a.base() < b.base());
                }
            }
        }
    }
}
