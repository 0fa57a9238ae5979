//! HAVING predicate engine for grouped query results.
//!
//! ## Crate layout
//! - `predicate`: the predicate tree, row evaluation, cache-key encoding and
//!   the declarative JSON spec.
//! - `filter`: per-query handle that parses, evaluates and memoizes the key.
//! - `config`: parse-time limits for caller-supplied specs.
//! - `error`: spec, evaluation and config error types.
//! - `obs`: counters and the sink they are recorded through.

mod logging;

pub mod config;
pub mod error;
pub mod filter;
pub mod obs;
pub mod predicate;

pub use config::HavingConfig;
pub use error::{ConfigError, ErrorClass, ErrorOrigin, EvalError, InvalidSpecError};
pub use filter::HavingFilter;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::HavingConfig,
        error::{EvalError, InvalidSpecError},
        filter::HavingFilter,
        predicate::{
            CacheKey, CompareOp, FieldPresence, MetricValue, Predicate, Row, encode, eval,
        },
    };
}
