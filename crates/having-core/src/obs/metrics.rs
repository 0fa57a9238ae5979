use crate::obs::sink::MetricsEvent;
use serde::{Deserialize, Serialize};
use std::sync::{LazyLock, Mutex, PoisonError};

///
/// EventState
/// Process-wide counters for HAVING spec parsing and row filtering.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
}

impl EventState {
    /// Fold one event into the counters.
    pub(crate) fn apply(&mut self, event: MetricsEvent) {
        let ops = &mut self.ops;
        match event {
            MetricsEvent::SpecParsed => ops.specs_parsed = ops.specs_parsed.saturating_add(1),
            MetricsEvent::SpecRejected => {
                ops.specs_rejected = ops.specs_rejected.saturating_add(1);
            }
            MetricsEvent::RowsFiltered { evaluated, kept } => {
                ops.rows_evaluated = ops.rows_evaluated.saturating_add(evaluated);
                ops.rows_kept = ops.rows_kept.saturating_add(kept);
            }
            MetricsEvent::EvalFailed => ops.eval_errors = ops.eval_errors.saturating_add(1),
            MetricsEvent::CacheKeyComputed { key_len } => {
                ops.cache_keys_computed = ops.cache_keys_computed.saturating_add(1);
                ops.cache_key_bytes = ops.cache_key_bytes.saturating_add(key_len);
            }
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Spec conversion
    pub specs_parsed: u64,
    pub specs_rejected: u64,

    // Row filtering
    pub rows_evaluated: u64,
    pub rows_kept: u64,
    pub eval_errors: u64,

    // Cache keys
    pub cache_keys_computed: u64,
    pub cache_key_bytes: u64,
}

///
/// EventReport
/// Point-in-time copy of the counters.
///

pub type EventReport = EventState;

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    let state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&state)
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state)
}

#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// TESTS
///
