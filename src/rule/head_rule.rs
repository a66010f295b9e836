use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{BeamgeomError, Result, RuleError};
use crate::geometry::{HalfSpace, Surface};
use crate::math::Point3;
use crate::registry::SurfaceRegistry;

use super::{parse_concrete_expr, Rule};

/// A boolean half-space expression, possibly empty.
///
/// The empty rule is the identity for both [`intersect`](Self::intersect)
/// and [`union_with`](Self::union_with): combining it with `x` gives `x`.
/// It evaluates as valid everywhere.
///
/// Equality compares the logical expression only; surfaces bound by
/// [`populate_surf`](Self::populate_surf) are a cache.
#[derive(Debug, Clone, Default)]
pub struct HeadRule {
    root: Option<Rule>,
    bound: BTreeMap<i32, Surface>,
}

impl PartialEq for HeadRule {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for HeadRule {}

impl HeadRule {
    /// Creates an empty rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule holding a single signed surface.
    #[must_use]
    pub fn from_surf(signed: i32) -> Self {
        Self::from_rule(Rule::Surf(signed))
    }

    /// Intersection of signed surfaces, in order.
    #[must_use]
    pub fn from_surfs(signed: &[i32]) -> Self {
        if signed.is_empty() {
            return Self::new();
        }
        Self::from_rule(Rule::and(signed.iter().map(|&n| Rule::Surf(n)).collect()))
    }

    /// Wraps an already resolved rule.
    #[must_use]
    pub fn from_rule(rule: Rule) -> Self {
        Self {
            root: Some(rule),
            bound: BTreeMap::new(),
        }
    }

    /// Parses a rule written with concrete surface numbers.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed text or base suffixes.
    pub fn parse(text: &str) -> Result<Self> {
        let Some(expr) = parse_concrete_expr(text)? else {
            return Ok(Self::new());
        };
        let rule = expr.resolve_with(&|_, magnitude| Ok(magnitude))?;
        Ok(Self::from_rule(rule))
    }

    /// Returns `true` if the rule holds an expression.
    #[must_use]
    pub fn has_rule(&self) -> bool {
        self.root.is_some()
    }

    /// Returns the resolved tree, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Rule> {
        self.root.as_ref()
    }

    /// Intersection of two rules.
    #[must_use]
    pub fn intersect(&self, other: &HeadRule) -> HeadRule {
        let mut out = self.clone();
        out.add_intersection(other);
        out
    }

    /// Union of two rules.
    #[must_use]
    pub fn union_with(&self, other: &HeadRule) -> HeadRule {
        let mut out = self.clone();
        out.add_union(other);
        out
    }

    /// Complement of the rule. The empty rule stays empty.
    #[must_use]
    pub fn complement(&self) -> HeadRule {
        let mut out = self.clone();
        out.make_complement();
        out
    }

    /// In-place intersection.
    pub fn add_intersection(&mut self, other: &HeadRule) {
        self.combine(other, Rule::and);
    }

    /// In-place intersection with a single signed surface.
    pub fn add_intersection_surf(&mut self, signed: i32) {
        self.add_intersection(&HeadRule::from_surf(signed));
    }

    /// In-place union.
    pub fn add_union(&mut self, other: &HeadRule) {
        self.combine(other, Rule::or);
    }

    /// In-place complement.
    pub fn make_complement(&mut self) {
        self.root = self.root.as_ref().map(Rule::complement);
    }

    fn combine(&mut self, other: &HeadRule, join: fn(Vec<Rule>) -> Rule) {
        let Some(theirs) = other.root.clone() else {
            return;
        };
        self.root = Some(match self.root.take() {
            Some(ours) => join(vec![ours, theirs]),
            None => theirs,
        });
        for (id, surface) in &other.bound {
            self.bound.entry(*id).or_insert_with(|| surface.clone());
        }
    }

    /// Canonical text form, the same grammar [`parse`](Self::parse) reads.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Signed leaves in tree order.
    #[must_use]
    pub fn surfaces(&self) -> Vec<i32> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_surfaces(&mut out);
        }
        out
    }

    /// Distinct unsigned surface numbers.
    #[must_use]
    pub fn surface_numbers(&self) -> BTreeSet<i32> {
        self.surfaces().into_iter().map(i32::abs).collect()
    }

    /// Replaces surface `old` by `new`, keeping each leaf's sign relative to
    /// the replacement. Returns the number of leaves changed.
    pub fn substitute_surf(&mut self, old: i32, new: i32) -> usize {
        let (old, new) = if old < 0 { (-old, -new) } else { (old, new) };
        let Some(root) = self.root.as_mut() else {
            return 0;
        };
        let changed = root.map_leaves(&|n| {
            if n == old {
                Some(new)
            } else if n == -old {
                Some(-new)
            } else {
                None
            }
        });
        if changed > 0 {
            self.bound.remove(&old);
        }
        changed
    }

    /// Removes every leaf on surface `surf` (either sign). Returns `true`
    /// if anything was removed.
    pub fn remove_surf(&mut self, surf: i32) -> bool {
        let target = surf.abs();
        if !self.surface_numbers().contains(&target) {
            return false;
        }
        self.root = self.root.take().and_then(|root| root.prune(&|n| n.abs() == target));
        self.bound.remove(&target);
        true
    }

    /// Binds every leaf to its primitive in `registry` for later evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownSurface`] if a leaf is not registered.
    pub fn populate_surf(&mut self, registry: &SurfaceRegistry) -> Result<()> {
        let mut bound = BTreeMap::new();
        for id in self.surface_numbers() {
            let surface = registry.surface(id).ok_or(RuleError::UnknownSurface(id))?;
            bound.insert(id, surface.clone());
        }
        self.bound = bound;
        Ok(())
    }

    /// Returns `true` if every leaf has a bound primitive.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.surface_numbers().iter().all(|id| self.bound.contains_key(id))
    }

    /// Evaluates the rule at `point` using the bound primitives.
    ///
    /// A positive leaf holds strictly on the positive side of its surface;
    /// a negative leaf holds everywhere else, so `n` and `-n` partition space.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnboundSurface`] if a leaf was never bound.
    pub fn is_valid(&self, point: &Point3) -> Result<bool> {
        let Some(root) = &self.root else {
            return Ok(true);
        };
        root.evaluate(&|n: i32| {
            let surface = self
                .bound
                .get(&n.abs())
                .ok_or(RuleError::UnboundSurface(n.abs()))?;
            Ok::<bool, BeamgeomError>(side_holds(surface, n, point))
        })
    }

    /// Evaluates the rule at `point`, reading primitives straight from the
    /// registry without binding.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownSurface`] if a leaf is not registered.
    pub fn is_valid_in(&self, registry: &SurfaceRegistry, point: &Point3) -> Result<bool> {
        let Some(root) = &self.root else {
            return Ok(true);
        };
        root.evaluate(&|n: i32| {
            let surface = registry.surface(n).ok_or(RuleError::UnknownSurface(n.abs()))?;
            Ok::<bool, BeamgeomError>(side_holds(surface, n, point))
        })
    }
}

fn side_holds(surface: &Surface, signed: i32, point: &Point3) -> bool {
    let positive = surface.side_value(point) > 0.0;
    if signed > 0 {
        positive
    } else {
        !positive
    }
}

impl fmt::Display for HeadRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{root}"),
            None => Ok(()),
        }
    }
}

impl FromStr for HeadRule {
    type Err = BeamgeomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<i32> for HeadRule {
    fn from(signed: i32) -> Self {
        Self::from_surf(signed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use proptest::prelude::*;

    fn sample_points() -> Vec<Point3> {
        let mut pts = Vec::new();
        for i in -4..=4 {
            for j in -4..=4 {
                for k in -2..=2 {
                    pts.push(Point3::new(f64::from(i) * 1.7, f64::from(j) * 1.3, f64::from(k) * 2.1));
                }
            }
        }
        pts
    }

    fn registry() -> SurfaceRegistry {
        let mut reg = SurfaceRegistry::default();
        reg.build_plane(1, Point3::origin(), Vector3::y()).unwrap();
        reg.build_cylinder(2, Point3::origin(), Vector3::y(), 5.0).unwrap();
        reg.build_plane(3, Point3::new(0.0, 4.0, 0.0), Vector3::y()).unwrap();
        reg.build_sphere(4, Point3::new(1.0, 1.0, 0.0), 3.0).unwrap();
        reg
    }

    #[test]
    fn empty_is_identity() {
        let a = HeadRule::parse("1 -2").unwrap();
        let empty = HeadRule::new();
        assert_eq!(empty.intersect(&a), a);
        assert_eq!(a.intersect(&empty), a);
        assert_eq!(empty.union_with(&a), a);
        assert_eq!(a.union_with(&empty), a);
        assert!(!empty.complement().has_rule());
        assert_eq!(empty.display(), "");
    }

    #[test]
    fn combination_display() {
        let a = HeadRule::parse("1 -2").unwrap();
        let b = HeadRule::parse("3 : -4").unwrap();
        assert_eq!(a.intersect(&b).display(), "1 -2 (3 : -4)");
        assert_eq!(a.union_with(&b).display(), "1 -2 : 3 : -4");
        assert_eq!(b.complement().display(), "-3 4");
    }

    #[test]
    fn parse_display_roundtrip_literal() {
        for text in ["1 -2", "1 -2 : 3", "(1 : 2) -3 (4 : -1 2)", "-7"] {
            let rule = HeadRule::parse(text).unwrap();
            assert_eq!(rule.display(), text);
            assert_eq!(HeadRule::parse(&rule.display()).unwrap(), rule);
        }
    }

    #[test]
    fn base_suffix_rejected_in_concrete_rule() {
        let err = HeadRule::parse("1 -23M").unwrap_err();
        assert!(matches!(
            err,
            BeamgeomError::Rule(RuleError::Parse { position: 5, .. })
        ));
    }

    #[test]
    fn unbound_evaluation_fails() {
        let rule = HeadRule::parse("1 -2").unwrap();
        let err = rule.is_valid(&Point3::origin()).unwrap_err();
        assert!(matches!(err, BeamgeomError::Rule(RuleError::UnboundSurface(1))));
    }

    #[test]
    fn bound_evaluation() {
        let reg = registry();
        let mut rule = HeadRule::parse("1 -2 -3").unwrap();
        rule.populate_surf(&reg).unwrap();
        assert!(rule.is_populated());
        assert!(rule.is_valid(&Point3::new(0.0, 2.0, 1.0)).unwrap());
        assert!(!rule.is_valid(&Point3::new(0.0, 5.0, 1.0)).unwrap());
        assert!(!rule.is_valid(&Point3::new(6.0, 2.0, 0.0)).unwrap());
        assert_eq!(
            rule.is_valid(&Point3::new(0.0, 2.0, 1.0)).unwrap(),
            rule.is_valid_in(&reg, &Point3::new(0.0, 2.0, 1.0)).unwrap()
        );
    }

    #[test]
    fn populate_unknown_surface() {
        let reg = registry();
        let mut rule = HeadRule::parse("1 -99").unwrap();
        assert!(rule.populate_surf(&reg).is_err());
    }

    #[test]
    fn complement_laws_over_grid() {
        let reg = registry();
        for text in ["1 -2 -3", "1 -2 : 4", "(1 : -4) -3 : 2 -1"] {
            let mut h = HeadRule::parse(text).unwrap();
            h.populate_surf(&reg).unwrap();
            let never = h.intersect(&h.complement());
            let always = h.union_with(&h.complement());
            for p in sample_points() {
                assert!(!never.is_valid(&p).unwrap(), "{text} at {p}");
                assert!(always.is_valid(&p).unwrap(), "{text} at {p}");
            }
        }
    }

    #[test]
    fn substitute_keeps_relative_sign() {
        let mut rule = HeadRule::parse("1 -2 (3 : -1)").unwrap();
        assert_eq!(rule.substitute_surf(1, -9), 2);
        assert_eq!(rule.display(), "-9 -2 (3 : 9)");
        assert_eq!(rule.substitute_surf(5, 6), 0);
    }

    #[test]
    fn remove_surface() {
        let mut rule = HeadRule::parse("1 -2 (3 : -1)").unwrap();
        assert!(rule.remove_surf(-1));
        assert_eq!(rule.display(), "-2 3");
        assert!(!rule.remove_surf(8));
        let mut single = HeadRule::from_surf(4);
        assert!(single.remove_surf(4));
        assert!(!single.has_rule());
    }

    #[test]
    fn surface_listing() {
        let rule = HeadRule::parse("4 -2 (3 : -4)").unwrap();
        assert_eq!(rule.surfaces(), vec![4, -2, 3, -4]);
        assert_eq!(rule.surface_numbers().into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(HeadRule::from_surfs(&[1, -2]).display(), "1 -2");
    }

    fn arb_rule() -> impl Strategy<Value = Rule> {
        let leaf = (1i32..50, any::<bool>()).prop_map(|(n, neg)| Rule::Surf(if neg { -n } else { n }));
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 2..4).prop_map(Rule::and),
                prop::collection::vec(inner, 2..4).prop_map(Rule::or),
            ]
        })
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(rule in arb_rule()) {
            let h = HeadRule::from_rule(rule);
            let back = HeadRule::parse(&h.display()).unwrap();
            prop_assert_eq!(back, h);
        }

        #[test]
        fn double_complement_is_identity(rule in arb_rule()) {
            let h = HeadRule::from_rule(rule);
            prop_assert_eq!(h.complement().complement(), h);
        }
    }
}
