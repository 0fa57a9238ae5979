//! Structured `event=<name> k=v` logging for host-facing hooks.

pub(crate) const LOG_TARGET: &str = "having::lifecycle";

macro_rules! lifecycle_log {
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

pub(crate) use lifecycle_log;
