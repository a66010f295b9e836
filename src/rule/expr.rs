use crate::error::{Result, RuleError};
use crate::index::IndexBlock;
use crate::registry::SurfaceRegistry;

use super::{parse_expr, HeadRule, Rule};

/// Which index base a local offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseSel {
    /// The component's own block.
    Primary,
    /// Secondary block, written with an `M` suffix.
    M,
    /// Tertiary block, written with an `N` suffix.
    N,
}

impl BaseSel {
    fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "",
            Self::M => "M",
            Self::N => "N",
        }
    }
}

/// The one to three index bases a rule is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bases {
    primary: i32,
    m: Option<i32>,
    n: Option<i32>,
}

impl Bases {
    /// Bases with only a primary block.
    #[must_use]
    pub fn new(primary: i32) -> Self {
        Self {
            primary,
            m: None,
            n: None,
        }
    }

    /// Adds the secondary (`M`) base.
    #[must_use]
    pub fn with_m(mut self, base: i32) -> Self {
        self.m = Some(base);
        self
    }

    /// Adds the tertiary (`N`) base.
    #[must_use]
    pub fn with_n(mut self, base: i32) -> Self {
        self.n = Some(base);
        self
    }

    /// Returns the base for a selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector's base was not supplied.
    pub fn get(&self, sel: BaseSel) -> Result<i32> {
        match sel {
            BaseSel::Primary => Ok(self.primary),
            BaseSel::M => self.m.ok_or_else(|| RuleError::MissingBase('M').into()),
            BaseSel::N => self.n.ok_or_else(|| RuleError::MissingBase('N').into()),
        }
    }
}

impl From<IndexBlock> for Bases {
    fn from(block: IndexBlock) -> Self {
        Self::new(block.base())
    }
}

/// Unresolved rule over local offsets.
///
/// Components may build these directly or parse them from text with
/// [`parse_expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// Signed local offset against one of the bases.
    Offset {
        base: BaseSel,
        magnitude: i32,
        negative: bool,
    },
    /// Intersection.
    And(Vec<RuleExpr>),
    /// Union.
    Or(Vec<RuleExpr>),
    /// Complement.
    Not(Box<RuleExpr>),
}

impl RuleExpr {
    /// Signed offset against the primary base; `-4` is the negative side of
    /// local surface 4.
    #[must_use]
    pub fn surf(offset: i32) -> Self {
        Self::offset(BaseSel::Primary, offset)
    }

    /// Signed offset against the `M` base.
    #[must_use]
    pub fn surf_m(offset: i32) -> Self {
        Self::offset(BaseSel::M, offset)
    }

    /// Signed offset against the `N` base.
    #[must_use]
    pub fn surf_n(offset: i32) -> Self {
        Self::offset(BaseSel::N, offset)
    }

    fn offset(base: BaseSel, offset: i32) -> Self {
        Self::Offset {
            base,
            magnitude: offset.saturating_abs(),
            negative: offset < 0,
        }
    }

    /// Complement of this expression.
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Resolves every leaf with `leaf(base, magnitude)` into a signed
    /// surface number and builds the normalised [`Rule`].
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `leaf`.
    pub fn resolve_with(&self, leaf: &impl Fn(BaseSel, i32) -> Result<i32>) -> Result<Rule> {
        match self {
            Self::Offset {
                base,
                magnitude,
                negative,
            } => {
                let id = leaf(*base, *magnitude)?;
                Ok(Rule::Surf(if *negative { -id } else { id }))
            }
            Self::And(items) => Ok(Rule::and(
                items.iter().map(|e| e.resolve_with(leaf)).collect::<Result<_>>()?,
            )),
            Self::Or(items) => Ok(Rule::or(
                items.iter().map(|e| e.resolve_with(leaf)).collect::<Result<_>>()?,
            )),
            Self::Not(inner) => Ok(inner.resolve_with(leaf)?.complement()),
        }
    }

    /// Resolves local offsets against `bases` through the registry's
    /// logical numbers.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnresolvedSurface`] if no surface was built at
    /// `base + offset`, or [`RuleError::MissingBase`] for an absent base.
    pub fn resolve(&self, registry: &SurfaceRegistry, bases: &Bases) -> Result<HeadRule> {
        let rule = self.resolve_with(&|sel, magnitude| {
            let base = bases.get(sel)?;
            base.checked_add(magnitude)
                .and_then(|logical| registry.realise(logical))
                .ok_or_else(|| {
                    RuleError::UnresolvedSurface {
                        offset: magnitude,
                        base,
                    }
                    .into()
                })
        })?;
        Ok(HeadRule::from_rule(rule))
    }

    /// Writes the expression back in the text grammar.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Offset {
                base,
                magnitude,
                negative,
            } => {
                let sign = if *negative { "-" } else { "" };
                format!("{sign}{magnitude}{}", base.suffix())
            }
            Self::And(items) => items
                .iter()
                .map(|e| match e {
                    Self::Or(_) => format!("({})", e.to_text()),
                    _ => e.to_text(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            Self::Or(items) => items
                .iter()
                .map(|e| match e {
                    Self::Or(_) => format!("({})", e.to_text()),
                    _ => e.to_text(),
                })
                .collect::<Vec<_>>()
                .join(" : "),
            Self::Not(inner) => format!("#({})", inner.to_text()),
        }
    }
}

/// Composes rule text against one to three index bases.
///
/// Blank text yields an empty rule. The result holds only registry surface
/// numbers; the text and the bases can be discarded afterwards.
///
/// # Errors
///
/// Returns a parse error for malformed text and
/// [`RuleError::UnresolvedSurface`] for offsets with no surface built.
pub fn compose(registry: &SurfaceRegistry, bases: &Bases, text: &str) -> Result<HeadRule> {
    match parse_expr(text)? {
        Some(expr) => expr.resolve(registry, bases),
        None => Ok(HeadRule::new()),
    }
}
