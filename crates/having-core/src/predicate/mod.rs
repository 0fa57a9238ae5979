//! HAVING predicate trees: model, row evaluation, cache-key encoding and
//! declarative spec conversion.

mod cache_key;
mod eval;
mod model;
mod row;
pub mod spec;


pub use cache_key::{CacheKey, KeyFingerprint, encode};
pub use eval::eval;
pub use model::{CompareOp, ComparePredicate, Predicate};
pub use row::{FieldPresence, MetricValue, Row};
