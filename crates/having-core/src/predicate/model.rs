use crate::error::InvalidSpecError;
use derive_more::Display;
use std::{
    collections::BTreeSet,
    ops::{BitAnd, BitOr, Not},
};

///
/// Predicate model
///
/// Immutable HAVING predicate trees. Nodes carry structure only; evaluation,
/// cache-key encoding and spec conversion dispatch on the variant elsewhere.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum CompareOp {
    #[display("greaterThan")]
    GreaterThan = 0x01,
    #[display("lessThan")]
    LessThan = 0x02,
    #[display("equalTo")]
    EqualTo = 0x03,
}

impl CompareOp {
    /// Stable tag byte used by the cache-key encoding.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Discriminator used by the declarative spec grammar.
    #[must_use]
    pub const fn spec_type(self) -> &'static str {
        match self {
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::EqualTo => "equalTo",
        }
    }

    /// Apply the operator with IEEE-754 double semantics.
    #[must_use]
    #[expect(clippy::float_cmp)]
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::EqualTo => value == threshold,
        }
    }
}

///
/// ComparePredicate
///
/// One metric comparison. Fields are private so the invariants checked in
/// `try_new` (non-empty name, finite threshold) hold for every instance.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparePredicate {
    op: CompareOp,
    field: String,
    threshold: f64,
}

impl ComparePredicate {
    pub fn try_new(
        op: CompareOp,
        field: impl Into<String>,
        threshold: f64,
    ) -> Result<Self, InvalidSpecError> {
        let field = field.into();
        if field.is_empty() {
            return Err(InvalidSpecError::EmptyField);
        }
        if !threshold.is_finite() {
            return Err(InvalidSpecError::NonFiniteThreshold { field });
        }

        // -0.0 and 0.0 compare equal; store one of them so equal trees encode equally.
        let threshold = if threshold == 0.0 { 0.0 } else { threshold };

        Ok(Self {
            op,
            field,
            threshold,
        })
    }

    #[must_use]
    pub const fn op(&self) -> CompareOp {
        self.op
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

// Thresholds are always finite, so equality is reflexive.
impl Eq for ComparePredicate {}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    Always,
    Never,
    Not(Box<Self>),
    And(Vec<Self>),
    Or(Vec<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub const fn and(children: Vec<Self>) -> Self {
        Self::And(children)
    }

    #[must_use]
    pub const fn or(children: Vec<Self>) -> Self {
        Self::Or(children)
    }

    #[must_use]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// Assemble a negation from an untyped child list.
    pub fn try_not(mut children: Vec<Self>) -> Result<Self, InvalidSpecError> {
        match children.len() {
            1 => Ok(Self::not(children.remove(0))),
            found => Err(InvalidSpecError::NotArity { found }),
        }
    }

    pub fn compare(
        op: CompareOp,
        field: impl Into<String>,
        threshold: f64,
    ) -> Result<Self, InvalidSpecError> {
        ComparePredicate::try_new(op, field, threshold).map(Self::Compare)
    }

    pub fn greater_than(field: impl Into<String>, threshold: f64) -> Result<Self, InvalidSpecError> {
        Self::compare(CompareOp::GreaterThan, field, threshold)
    }

    pub fn less_than(field: impl Into<String>, threshold: f64) -> Result<Self, InvalidSpecError> {
        Self::compare(CompareOp::LessThan, field, threshold)
    }

    pub fn equal_to(field: impl Into<String>, threshold: f64) -> Result<Self, InvalidSpecError> {
        Self::compare(CompareOp::EqualTo, field, threshold)
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Always | Self::Never | Self::Compare(_) => 1,
            Self::Not(child) => 1 + child.depth(),
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Always | Self::Never | Self::Compare(_) => 1,
            Self::Not(child) => 1 + child.node_count(),
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Self::node_count).sum::<usize>()
            }
        }
    }

    /// Metric names referenced by comparison leaves, sorted and deduplicated.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = BTreeSet::new();
        collect_fields(self, &mut fields);

        fields.into_iter().collect()
    }
}

fn collect_fields<'a>(predicate: &'a Predicate, out: &mut BTreeSet<&'a str>) {
    match predicate {
        Predicate::Always | Predicate::Never => {}
        Predicate::Not(child) => collect_fields(child, out),
        Predicate::And(children) | Predicate::Or(children) => {
            for child in children {
                collect_fields(child, out);
            }
        }
        Predicate::Compare(cmp) => {
            out.insert(cmp.field());
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

///
/// TESTS
///
