//! Metrics sink boundary.
//!
//! Engine logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    SpecParsed,
    SpecRejected,
    RowsFiltered { evaluated: u64, kept: u64 },
    EvalFailed,
    CacheKeyComputed { key_len: u64 },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the process-wide counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| m.apply(event));
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the process-wide counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the process-wide counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary, thread-scoped metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink {
        events: RefCell<Vec<MetricsEvent>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[test]
    fn override_captures_events_and_is_restored() {
        let outer = Rc::new(CaptureSink::default());
        let inner = Rc::new(CaptureSink::default());

        with_metrics_sink(outer.clone(), || {
            record(MetricsEvent::SpecParsed);
            with_metrics_sink(inner.clone(), || record(MetricsEvent::EvalFailed));
            record(MetricsEvent::SpecRejected);
        });

        assert_eq!(
            *outer.events.borrow(),
            vec![MetricsEvent::SpecParsed, MetricsEvent::SpecRejected]
        );
        assert_eq!(*inner.events.borrow(), vec![MetricsEvent::EvalFailed]);
        assert!(SINK_OVERRIDE.with(|cell| cell.borrow().is_none()));
    }

    #[test]
    fn global_sink_feeds_the_report() {
        let before = metrics_report().ops;

        record(MetricsEvent::EvalFailed);
        record(MetricsEvent::RowsFiltered {
            evaluated: 3,
            kept: 1,
        });

        // Other tests share the process-wide counters, so only lower bounds hold.
        let after = metrics_report().ops;
        assert!(after.eval_errors > before.eval_errors);
        assert!(after.rows_evaluated >= before.rows_evaluated + 3);
        assert!(after.rows_kept > before.rows_kept);
    }

    #[test]
    fn override_is_restored_after_panic() {
        let sink = Rc::new(CaptureSink::default());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(SINK_OVERRIDE.with(|cell| cell.borrow().is_none()));
    }
}
