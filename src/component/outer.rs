use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{LookupError, Result};
use crate::model::BuildContext;
use crate::rule::HeadRule;

/// Name of the unnamed envelope.
pub const MAIN_ENVELOPE: &str = "Main";

/// Outer envelopes of one component and the host cells it must be cut from.
///
/// Host cells are recorded as plain numbers and resolved only in
/// [`insert_objects`](Self::insert_objects), so they may be created after
/// the request is made. Each (host, envelope) pair is applied at most once.
#[derive(Debug, Clone, Default)]
pub struct OuterSurfaceSet {
    owner: String,
    envelopes: BTreeMap<String, HeadRule>,
    inserts: Vec<(String, i32)>,
}

impl OuterSurfaceSet {
    #[must_use]
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            envelopes: BTreeMap::new(),
            inserts: Vec::new(),
        }
    }

    /// Intersects `rule` into the main envelope.
    pub fn add_outer_surf(&mut self, rule: &HeadRule) {
        self.add_named_outer_surf(MAIN_ENVELOPE, rule);
    }

    /// Replaces the main envelope.
    pub fn set_outer_surf(&mut self, rule: HeadRule) {
        self.envelopes.insert(MAIN_ENVELOPE.to_owned(), rule);
    }

    /// Unions `rule` into the main envelope.
    pub fn add_outer_union_surf(&mut self, rule: &HeadRule) {
        self.envelopes
            .entry(MAIN_ENVELOPE.to_owned())
            .or_default()
            .add_union(rule);
    }

    /// Intersects `rule` into a named envelope such as `"Inner"` or `"Outer"`.
    pub fn add_named_outer_surf(&mut self, envelope: &str, rule: &HeadRule) {
        self.envelopes
            .entry(envelope.to_owned())
            .or_default()
            .add_intersection(rule);
    }

    /// The main envelope; empty if never set.
    #[must_use]
    pub fn outer_surf(&self) -> HeadRule {
        self.envelopes.get(MAIN_ENVELOPE).cloned().unwrap_or_default()
    }

    /// A named envelope.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NameNotFound`] if no such envelope exists.
    pub fn named_outer(&self, envelope: &str) -> Result<&HeadRule> {
        self.envelopes.get(envelope).ok_or_else(|| {
            LookupError::NameNotFound {
                owner: self.owner.clone(),
                name: envelope.to_owned(),
            }
            .into()
        })
    }

    /// The region outside the main envelope, used to carve host cells.
    #[must_use]
    pub fn exclude(&self) -> HeadRule {
        self.outer_surf().complement()
    }

    /// Requests insertion of the main envelope into a host cell.
    pub fn add_insert_cell(&mut self, host: i32) {
        self.add_named_insert_cell(MAIN_ENVELOPE, host);
    }

    /// Requests insertion of a named envelope into a host cell.
    pub fn add_named_insert_cell(&mut self, envelope: &str, host: i32) {
        let entry = (envelope.to_owned(), host);
        if !self.inserts.contains(&entry) {
            self.inserts.push(entry);
        }
    }

    /// Requests insertion of the main envelope into several hosts.
    pub fn add_insert_cells(&mut self, hosts: &[i32]) {
        for &host in hosts {
            self.add_insert_cell(host);
        }
    }

    /// Recorded (envelope, host cell) pairs in request order.
    #[must_use]
    pub fn insert_cells(&self) -> &[(String, i32)] {
        &self.inserts
    }

    /// Subtracts each envelope from its recorded host cells.
    ///
    /// Returns the number of pairs newly applied; a second call applies
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::HostCellNotFound`] if a host cell does not
    /// exist, or [`LookupError::NameNotFound`] for an unknown envelope.
    pub fn insert_objects(&self, ctx: &mut BuildContext) -> Result<usize> {
        let mut applied = 0;
        for (envelope, host) in &self.inserts {
            let outer = match self.envelopes.get(envelope) {
                Some(rule) if rule.has_rule() => rule,
                Some(_) => {
                    warn!(owner = %self.owner, envelope, host, "empty envelope not inserted");
                    continue;
                }
                None => {
                    return Err(LookupError::NameNotFound {
                        owner: self.owner.clone(),
                        name: envelope.clone(),
                    }
                    .into())
                }
            };
            if ctx.insert_into(*host, &self.tag(envelope), &outer.complement())? {
                applied += 1;
            }
        }
        debug!(owner = %self.owner, applied, "insert objects");
        Ok(applied)
    }

    /// Subtracts the main envelope from one host cell immediately, sharing
    /// the once-only bookkeeping of [`insert_objects`](Self::insert_objects).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::HostCellNotFound`] if the host does not exist.
    pub fn insert_into(&self, ctx: &mut BuildContext, host: i32) -> Result<bool> {
        let outer = self.outer_surf();
        if !outer.has_rule() {
            return Ok(false);
        }
        ctx.insert_into(host, &self.tag(MAIN_ENVELOPE), &outer.complement())
    }

    fn tag(&self, envelope: &str) -> String {
        format!("{}:{envelope}", self.owner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BeamgeomError;
    use crate::model::Cell;

    fn host_ctx() -> BuildContext {
        let mut ctx = BuildContext::default();
        ctx.add_cell(Cell::new(74, 0, 0.0, HeadRule::parse("1 -2").unwrap()))
            .unwrap();
        ctx
    }

    #[test]
    fn insertion_is_idempotent() {
        let mut ctx = host_ctx();
        let mut outer = OuterSurfaceSet::new("pipe");
        outer.add_outer_surf(&HeadRule::parse("3 -4 -7").unwrap());
        outer.add_insert_cell(74);
        outer.add_insert_cell(74);
        assert_eq!(outer.insert_objects(&mut ctx).unwrap(), 1);
        let once = ctx.cell(74).unwrap().rule().clone();
        assert_eq!(once.display(), "1 -2 (-3 : 4 : 7)");
        assert_eq!(outer.insert_objects(&mut ctx).unwrap(), 0);
        assert_eq!(ctx.cell(74).unwrap().rule(), &once);
    }

    #[test]
    fn missing_host() {
        let mut ctx = host_ctx();
        let mut outer = OuterSurfaceSet::new("pipe");
        outer.add_outer_surf(&HeadRule::from_surf(-7));
        outer.add_insert_cell(99_999);
        assert!(matches!(
            outer.insert_objects(&mut ctx),
            Err(BeamgeomError::Lookup(LookupError::HostCellNotFound(99_999)))
        ));
    }

    #[test]
    fn named_envelopes_are_separate() {
        let mut ctx = host_ctx();
        let mut outer = OuterSurfaceSet::new("bunker");
        outer.add_named_outer_surf("Inner", &HeadRule::from_surf(-5));
        outer.add_named_outer_surf("Outer", &HeadRule::from_surf(-6));
        outer.add_named_insert_cell("Inner", 74);
        outer.add_named_insert_cell("Outer", 74);
        assert_eq!(outer.insert_objects(&mut ctx).unwrap(), 2);
        assert_eq!(ctx.cell(74).unwrap().rule().display(), "1 -2 5 6");
        assert!(outer.named_outer("Middle").is_err());
    }

    #[test]
    fn union_envelope() {
        let mut outer = OuterSurfaceSet::new("pipe");
        outer.add_outer_surf(&HeadRule::from_surf(-7));
        outer.add_outer_union_surf(&HeadRule::from_surf(-17));
        assert_eq!(outer.outer_surf().display(), "-7 : -17");
        assert_eq!(outer.exclude().display(), "7 17");
    }
}
