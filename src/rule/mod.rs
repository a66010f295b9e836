//! Boolean half-space expressions.
//!
//! [`Rule`] is the resolved expression tree over signed surface numbers.
//! It is kept in a flattened, complement-free normal form: intersections
//! and unions alternate level by level and complements are pushed onto the
//! leaves with De Morgan's laws. [`HeadRule`] wraps an optional rule with
//! the algebra, display and point evaluation. [`RuleExpr`] is the unresolved
//! form components build against their index blocks, either directly or by
//! parsing the compact text grammar.

mod expr;
mod head_rule;
mod parse;

pub use expr::{compose, BaseSel, Bases, RuleExpr};
pub use head_rule::HeadRule;
pub use parse::parse_expr;
use parse::parse_concrete_expr;

use std::fmt;

/// Resolved expression tree over signed surface numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// A single half-space: positive or negative side of a surface.
    Surf(i32),
    /// All children hold.
    Intersection(Vec<Rule>),
    /// At least one child holds.
    Union(Vec<Rule>),
}

impl Rule {
    /// Builds an intersection, flattening nested intersections.
    ///
    /// A single item is returned unchanged.
    #[must_use]
    pub fn and(items: Vec<Rule>) -> Rule {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Rule::Intersection(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Rule::Intersection(flat)
        }
    }

    /// Builds a union, flattening nested unions.
    #[must_use]
    pub fn or(items: Vec<Rule>) -> Rule {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Rule::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Rule::Union(flat)
        }
    }

    /// Complement by De Morgan's laws.
    #[must_use]
    pub fn complement(&self) -> Rule {
        match self {
            Rule::Surf(n) => Rule::Surf(-n),
            Rule::Intersection(items) => Rule::or(items.iter().map(Rule::complement).collect()),
            Rule::Union(items) => Rule::and(items.iter().map(Rule::complement).collect()),
        }
    }

    /// Collects the signed leaves in tree order.
    pub fn collect_surfaces(&self, out: &mut Vec<i32>) {
        match self {
            Rule::Surf(n) => out.push(*n),
            Rule::Intersection(items) | Rule::Union(items) => {
                for item in items {
                    item.collect_surfaces(out);
                }
            }
        }
    }

    /// Evaluates the tree with `leaf` deciding each signed half-space.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `leaf`.
    pub fn evaluate<E>(&self, leaf: &impl Fn(i32) -> Result<bool, E>) -> Result<bool, E> {
        match self {
            Rule::Surf(n) => leaf(*n),
            Rule::Intersection(items) => {
                for item in items {
                    if !item.evaluate(leaf)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Rule::Union(items) => {
                for item in items {
                    if item.evaluate(leaf)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Rewrites leaves in place; `map` returns the replacement or `None` to keep.
    fn map_leaves(&mut self, map: &impl Fn(i32) -> Option<i32>) -> usize {
        match self {
            Rule::Surf(n) => match map(*n) {
                Some(replacement) => {
                    *n = replacement;
                    1
                }
                None => 0,
            },
            Rule::Intersection(items) | Rule::Union(items) => {
                items.iter_mut().map(|item| item.map_leaves(map)).sum()
            }
        }
    }

    /// Drops leaves for which `drop` is true. Returns `None` if nothing remains.
    fn prune(self, drop: &impl Fn(i32) -> bool) -> Option<Rule> {
        match self {
            Rule::Surf(n) => (!drop(n)).then_some(Rule::Surf(n)),
            Rule::Intersection(items) => {
                let kept: Vec<Rule> = items.into_iter().filter_map(|r| r.prune(drop)).collect();
                (!kept.is_empty()).then(|| Rule::and(kept))
            }
            Rule::Union(items) => {
                let kept: Vec<Rule> = items.into_iter().filter_map(|r| r.prune(drop)).collect();
                (!kept.is_empty()).then(|| Rule::or(kept))
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Surf(n) => write!(f, "{n}"),
            Rule::Intersection(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    if matches!(item, Rule::Union(_)) {
                        write!(f, "({item})")?;
                    } else {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Rule::Union(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" : ")?;
                    }
                    // Only reachable for hand-built trees; flattened unions never nest.
                    if matches!(item, Rule::Union(_)) {
                        write!(f, "({item})")?;
                    } else {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
