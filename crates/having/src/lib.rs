//! ## Crate layout
//! - `core`: predicate model, evaluation, cache keys, spec conversion,
//!   config and observability.
//! - `error`: public error taxonomy for callers.
//! - `lifecycle`: host-process shutdown hook.
//!
//! The `prelude` module mirrors the surface used by query executors.

pub use having_core as core;

mod logging;

pub mod error;
pub mod lifecycle;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use having_core::{HavingConfig, HavingFilter};
pub use error::Error;

///
/// Executor Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            config::HavingConfig,
            filter::HavingFilter,
            obs::{metrics_report, metrics_reset_all},
            predicate::{
                CacheKey, CompareOp, FieldPresence, MetricValue, Predicate, Row, encode, eval,
                spec,
            },
        },
        error::{Error, ErrorKind},
        lifecycle::LogShutdown,
    };
}
