use std::collections::BTreeMap;

use crate::error::{LookupError, Result};
use crate::math::{Point3, Vector3};
use crate::rule::HeadRule;

use super::FixedComp;

#[derive(Debug, Clone, Default)]
struct CutUnit {
    main: HeadRule,
    divider: HeadRule,
    connect: Option<(Point3, Vector3)>,
}

/// Bounding rules a component borrows from others, keyed by role
/// (`"front"`, `"back"`, `"boundary"`, ...).
///
/// A cut rule describes the region the component may occupy; a pipe whose
/// front is cut by the exit link of its parent stores the half-space beyond
/// that link.
#[derive(Debug, Clone, Default)]
pub struct ExternalCutSet {
    owner: String,
    cuts: BTreeMap<String, CutUnit>,
}

impl ExternalCutSet {
    #[must_use]
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            cuts: BTreeMap::new(),
        }
    }

    /// Sets a cut from an explicit rule.
    pub fn set_cut_surf(&mut self, name: &str, rule: HeadRule) {
        self.cuts.entry(name.to_owned()).or_default().main = rule;
    }

    /// Sets a cut from link `side` of another component: its main rule,
    /// its common rule as divider, and its anchor point.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is out of range or unset.
    pub fn set_cut_from_link(&mut self, name: &str, fc: &FixedComp, side: i32) -> Result<()> {
        let unit = CutUnit {
            main: fc.main_rule(side)?,
            divider: fc.common_rule(side)?,
            connect: Some((fc.link_pt(side)?, fc.link_axis(side)?)),
        };
        self.cuts.insert(name.to_owned(), unit);
        Ok(())
    }

    /// Sets the divider of a cut.
    pub fn set_divider(&mut self, name: &str, rule: HeadRule) {
        self.cuts.entry(name.to_owned()).or_default().divider = rule;
    }

    /// Returns `true` if a non-empty cut exists under `name`.
    #[must_use]
    pub fn has_cut(&self, name: &str) -> bool {
        self.cuts.get(name).is_some_and(|c| c.main.has_rule())
    }

    /// The cut rule.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] if the cut is unknown.
    pub fn rule(&self, name: &str) -> Result<HeadRule> {
        Ok(self.unit(name)?.main.clone())
    }

    /// The complement of the cut rule.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] if the cut is unknown.
    pub fn complement_rule(&self, name: &str) -> Result<HeadRule> {
        Ok(self.unit(name)?.main.complement())
    }

    /// The divider of a cut; empty if none was set.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] if the cut is unknown.
    pub fn divider(&self, name: &str) -> Result<HeadRule> {
        Ok(self.unit(name)?.divider.clone())
    }

    /// Cut rule intersected with its divider.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] if the cut is unknown.
    pub fn link_rule(&self, name: &str) -> Result<HeadRule> {
        let unit = self.unit(name)?;
        Ok(unit.main.intersect(&unit.divider))
    }

    /// Anchor of a cut taken from a link.
    #[must_use]
    pub fn cut_point(&self, name: &str) -> Option<(Point3, Vector3)> {
        self.cuts.get(name).and_then(|c| c.connect)
    }

    fn unit(&self, name: &str) -> Result<&CutUnit> {
        self.cuts.get(name).ok_or_else(|| {
            LookupError::NameNotFound {
                owner: self.owner.clone(),
                name: name.to_owned(),
            }
            .into()
        })
    }
}
