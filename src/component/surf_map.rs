use std::collections::BTreeMap;

use crate::error::{LookupError, Result};
use crate::rule::HeadRule;

/// Named surfaces of one component, e.g. `"FrontWall"` or `"InnerRadius"`.
///
/// Stores concrete signed registry ids. A name prefixed with `-` or `#`
/// reads the surface with its sign flipped.
#[derive(Debug, Clone, Default)]
pub struct SurfMap {
    owner: String,
    surfs: BTreeMap<String, Vec<i32>>,
}

impl SurfMap {
    #[must_use]
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            surfs: BTreeMap::new(),
        }
    }

    /// Replaces whatever is stored under `name`.
    pub fn set_surf(&mut self, name: &str, signed: i32) {
        self.surfs.insert(name.to_owned(), vec![signed]);
    }

    /// Appends a surface under `name`.
    pub fn add_surf(&mut self, name: &str, signed: i32) {
        self.surfs.entry(name.to_owned()).or_default().push(signed);
    }

    #[must_use]
    pub fn has_surf(&self, name: &str) -> bool {
        self.surfs.contains_key(split_sign(name).1)
    }

    /// Returns the `index`-th surface stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] or [`LookupError::IndexOutOfRange`].
    pub fn get_surf(&self, name: &str, index: usize) -> Result<i32> {
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

    /// First surface under `name`, honouring a leading sign flip.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] for an unknown name.
    pub fn get_signed_surf(&self, name: &str) -> Result<i32> {
        let (sign, bare) = split_sign(name);
        Ok(sign * self.get_surf(bare, 0)?)
    }

    /// Single-surface rule for `name` (sign prefix allowed).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] for an unknown name.
    pub fn surf_rule(&self, name: &str) -> Result<HeadRule> {
        self.get_signed_surf(name).map(HeadRule::from_surf)
    }

    /// Intersection of every surface under `name` (sign prefix flips each).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] for an unknown name.
    pub fn surf_rules(&self, name: &str) -> Result<HeadRule> {
        let (sign, bare) = split_sign(name);
        let signed: Vec<i32> = self.list(bare)?.iter().map(|s| sign * s).collect();
        Ok(HeadRule::from_surfs(&signed))
    }

    fn list(&self, name: &str) -> Result<&[i32]> {
        self.surfs.get(name).map(Vec::as_slice).ok_or_else(|| {
            LookupError::NameNotFound {
                owner: self.owner.clone(),
                name: name.to_owned(),
            }
            .into()
        })
    }
}

fn split_sign(name: &str) -> (i32, &str) {
    match name.strip_prefix(['-', '#']) {
        Some(rest) => (-1, rest),
        None => (1, name),
    }
}
