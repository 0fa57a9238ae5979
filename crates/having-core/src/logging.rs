//! Structured `event=<name> k=v` logging under a single target.

/// Single logging target for the HAVING engine.
pub(crate) const LOG_TARGET: &str = "having";

macro_rules! having_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use having_log;
