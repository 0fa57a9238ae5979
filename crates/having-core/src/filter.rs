use crate::{
    config::HavingConfig,
    error::{EvalError, InvalidSpecError},
    logging::having_log,
    obs::sink::{MetricsEvent, record},
    predicate::{CacheKey, Predicate, Row, encode, eval, spec},
};
use serde_json::Value;
use std::sync::OnceLock;

///
/// HavingFilter
///
/// Per-query handle over one immutable predicate tree. Shared by reference
/// (or behind `Arc`) across the workers that filter result rows; the cache
/// key is computed at most once per instance.
///

#[derive(Debug)]
pub struct HavingFilter {
    predicate: Predicate,
    cache_key: OnceLock<CacheKey>,
}

impl HavingFilter {
    #[must_use]
    pub const fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            cache_key: OnceLock::new(),
        }
    }

    /// Build a filter from a declarative spec, rejecting invalid specs up front.
    pub fn from_spec(value: &Value, config: &HavingConfig) -> Result<Self, InvalidSpecError> {
        match spec::parse_with(value, config) {
            Ok(predicate) => {
                record(MetricsEvent::SpecParsed);
                having_log!(
                    log::Level::Debug,
                    "spec_parsed",
                    "nodes={} depth={}",
                    predicate.node_count(),
                    predicate.depth()
                );

                Ok(Self::new(predicate))
            }
            Err(err) => {
                record(MetricsEvent::SpecRejected);
                having_log!(log::Level::Warn, "spec_rejected", "error=\"{}\"", err);

                Err(err)
            }
        }
    }

    pub fn from_json_str(text: &str, config: &HavingConfig) -> Result<Self, InvalidSpecError> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                let err = InvalidSpecError::from(err);
                record(MetricsEvent::SpecRejected);
                having_log!(log::Level::Warn, "spec_rejected", "error=\"{}\"", err);

                return Err(err);
            }
        };

        Self::from_spec(&value, config)
    }

    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Evaluate the predicate against one row.
    ///
    /// Records the row in the same counters `filter_rows` feeds.
    pub fn matches<R: Row + ?Sized>(&self, row: &R) -> Result<bool, EvalError> {
        match eval(row, &self.predicate) {
            Ok(matched) => {
                record(MetricsEvent::RowsFiltered {
                    evaluated: 1,
                    kept: u64::from(matched),
                });

                Ok(matched)
            }
            Err(err) => {
                record(MetricsEvent::EvalFailed);
                having_log!(log::Level::Warn, "eval_failed", "error=\"{}\"", err);

                Err(err)
            }
        }
    }

    /// Keep the rows that satisfy the predicate, in their original order.
    ///
    /// The first evaluation error aborts the pass; rows after it are not
    /// inspected.
    pub fn filter_rows<R, I>(&self, rows: I) -> Result<Vec<R>, EvalError>
    where
        R: Row,
        I: IntoIterator<Item = R>,
    {
        let mut kept = Vec::new();
        let mut evaluated = 0_u64;

        for row in rows {
            evaluated += 1;
            match eval(&row, &self.predicate) {
                Ok(true) => kept.push(row),
                Ok(false) => {}
                Err(err) => {
                    record(MetricsEvent::EvalFailed);
                    having_log!(
                        log::Level::Warn,
                        "eval_failed",
                        "row={} error=\"{}\"",
                        evaluated,
                        err
                    );

                    return Err(err);
                }
            }
        }

        record(MetricsEvent::RowsFiltered {
            evaluated,
            kept: kept.len() as u64,
        });

        Ok(kept)
    }

    /// Cache-key bytes for this predicate, computed on first use.
    pub fn cache_key(&self) -> &CacheKey {
        self.cache_key.get_or_init(|| {
            let key = encode(&self.predicate);
            record(MetricsEvent::CacheKeyComputed {
                key_len: key.len() as u64,
            });

            key
        })
    }

    /// Declarative spec for this filter.
    #[must_use]
    pub fn to_spec(&self) -> Value {
        spec::serialize(&self.predicate)
    }
}

impl From<Predicate> for HavingFilter {
    fn from(predicate: Predicate) -> Self {
        Self::new(predicate)
    }
}

impl Clone for HavingFilter {
    fn clone(&self) -> Self {
        let cache_key = OnceLock::new();
        if let Some(key) = self.cache_key.get() {
            let _ = cache_key.set(key.clone());
        }

        Self {
            predicate: self.predicate.clone(),
            cache_key,
        }
    }
}

impl PartialEq for HavingFilter {
    fn eq(&self, other: &Self) -> bool {
        self.predicate == other.predicate
    }
}

impl Eq for HavingFilter {}

///
/// TESTS
///
