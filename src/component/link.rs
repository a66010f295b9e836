use crate::math::{Point3, Vector3};
use crate::rule::HeadRule;

/// One attachment point of a component.
///
/// The main rule is the half-space on the far side of the link, away from
/// the component; reading it through a negative link index gives the side
/// facing into the component. The common rule is an optional extra
/// bounding condition (e.g. the divider between two faces sharing a link).
#[derive(Debug, Clone, Default)]
pub struct LinkPoint {
    name: Option<String>,
    connect: Option<(Point3, Vector3)>,
    main: Option<HeadRule>,
    common: HeadRule,
}

impl LinkPoint {
    /// Returns the link name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(super) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_owned());
    }

    /// Returns the anchor point and direction, if set.
    #[must_use]
    pub fn connect(&self) -> Option<&(Point3, Vector3)> {
        self.connect.as_ref()
    }

    pub(super) fn set_connect(&mut self, point: Point3, axis: Vector3) {
        self.connect = Some((point, axis));
    }

    /// Returns the main rule, if set.
    #[must_use]
    pub fn main(&self) -> Option<&HeadRule> {
        self.main.as_ref()
    }

    pub(super) fn set_main(&mut self, rule: HeadRule) {
        self.main = Some(rule);
    }

    pub(super) fn add_main(&mut self, rule: &HeadRule) {
        match &mut self.main {
            Some(main) => main.add_intersection(rule),
            None => self.main = Some(rule.clone()),
        }
    }

    /// Returns the common (bridging) rule; empty when unused.
    #[must_use]
    pub fn common(&self) -> &HeadRule {
        &self.common
    }

    pub(super) fn set_common(&mut self, rule: HeadRule) {
        self.common = rule;
    }

    /// Returns `true` once both the anchor and the main rule are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.connect.is_some() && self.main.is_some()
    }
}
