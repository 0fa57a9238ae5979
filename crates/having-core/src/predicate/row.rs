use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

///
/// MetricValue
///
/// Numeric metric as produced by the aggregation stage.
///
/// Comparisons widen to `f64`. `Long` values beyond 2^53 lose precision on
/// the way, and `Float` values keep their binary `f32` expansion, so an
/// `EqualTo` against a decimal literal such as `0.1` will not match an `f32`
/// metric holding `0.1`.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    Long(i64),
    Float(f32),
    Double(f64),
}

impl MetricValue {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Long(v) => v as f64,
            Self::Float(v) => f64::from(v),
            Self::Double(v) => v,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<i32> for MetricValue {
    fn from(value: i32) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<f32> for MetricValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

///
/// FieldPresence
///
/// Result of reading a metric from a row. Absence is explicit so the
/// evaluator can tell a misconfigured predicate from a non-match.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldPresence {
    Present(MetricValue),
    Missing,
}

impl From<Option<MetricValue>> for FieldPresence {
    fn from(value: Option<MetricValue>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

///
/// Row
///
/// Read-only view of one aggregated result row.
///

pub trait Row {
    fn metric(&self, name: &str) -> FieldPresence;
}

impl<R: Row + ?Sized> Row for &R {
    fn metric(&self, name: &str) -> FieldPresence {
        (**self).metric(name)
    }
}

impl<V> Row for BTreeMap<String, V>
where
    V: Copy + Into<MetricValue>,
{
    fn metric(&self, name: &str) -> FieldPresence {
        self.get(name).map(|value| (*value).into()).into()
    }
}

impl<V, S> Row for HashMap<String, V, S>
where
    V: Copy + Into<MetricValue>,
    S: BuildHasher,
{
    fn metric(&self, name: &str) -> FieldPresence {
        self.get(name).map(|value| (*value).into()).into()
    }
}

///
/// TESTS
///
