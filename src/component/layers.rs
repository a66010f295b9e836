//! Offset layout for nested wall layers.
//!
//! Layer `i` always owns local offsets `10*(i+1)+1 ..= 10*(i+1)+6`
//! (front, back, left, right, bottom, top), whether or not it has any
//! thickness. Zero-thickness layers build no surfaces and no cell, but the
//! offsets of the layers after them never move.

/// Offset stride between consecutive layers.
pub const LAYER_STRIDE: i32 = 10;

/// Number of faces a box layer owns.
pub const FACES: i32 = 6;

/// One entry of a layer layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSlot {
    /// Position in the thickness list.
    pub index: usize,
    /// Offset of the slot's base; face `k` lives at `base + k`.
    pub base: i32,
    pub thickness: f64,
    /// Total thickness of this layer and every layer inside it.
    pub outer: f64,
}

impl LayerSlot {
    /// Returns `true` if the layer is built.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.thickness > 0.0
    }

    /// Local offset of face `face` (1..=6).
    #[must_use]
    pub fn offset(&self, face: i32) -> i32 {
        debug_assert!((1..=FACES).contains(&face));
        self.base + face
    }
}

/// Lays out wall layers from the innermost outward.
///
/// Negative thicknesses are treated as zero.
#[must_use]
pub fn layer_layout(thicknesses: &[f64]) -> Vec<LayerSlot> {
    let mut outer = 0.0;
    thicknesses
        .iter()
        .enumerate()
        .map(|(index, &t)| {
            let thickness = t.max(0.0);
            outer += thickness;
            LayerSlot {
                index,
                base: LAYER_STRIDE * (i32::try_from(index).unwrap_or(i32::MAX - 1) + 1),
                thickness,
                outer,
            }
        })
        .collect()
}

/// Last active layer, whose outer faces bound the whole wall.
#[must_use]
pub fn outermost(layout: &[LayerSlot]) -> Option<&LayerSlot> {
    layout.iter().rev().find(|slot| slot.is_active())
}
