use derive_more::Display;
use having_core::error::{
    ConfigError, ErrorOrigin as CoreErrorOrigin, EvalError, InvalidSpecError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// HAVING failures are deterministic; retrying the same query cannot help.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

impl From<InvalidSpecError> for Error {
    fn from(err: InvalidSpecError) -> Self {
        let kind = match err {
            InvalidSpecError::Json { .. } => SpecErrorKind::Malformed,
            InvalidSpecError::TooDeep { .. }
            | InvalidSpecError::TooManyChildren { .. }
            | InvalidSpecError::FieldTooLong { .. } => SpecErrorKind::LimitExceeded,
            _ => SpecErrorKind::Invalid,
        };

        Self::new(ErrorKind::Spec(kind), err.origin().into(), err.to_string())
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::MissingField { .. } => Self::new(
                ErrorKind::Execution(ExecutionErrorKind::MissingMetric),
                err.origin().into(),
                err.to_string(),
            ),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, err.origin().into(), err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Spec(SpecErrorKind),
    Execution(ExecutionErrorKind),

    /// Engine limits could not be loaded.
    Config,
}

///
/// SpecErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SpecErrorKind {
    /// Spec shape is invalid (unknown type, missing or mistyped fields).
    Invalid,

    /// Spec text is not JSON.
    Malformed,

    /// Spec is well-formed but exceeds the configured parse limits.
    LimitExceeded,
}

///
/// ExecutionErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ExecutionErrorKind {
    /// A predicate referenced a metric the aggregated row does not carry.
    MissingMetric,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Eval,
    Serialize,
    Spec,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Eval => Self::Eval,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Spec => Self::Spec,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use having_core::HavingConfig;

    #[test]
    fn spec_errors_map_to_spec_kinds() {
        let err = Error::from(InvalidSpecError::UnknownType {
            found: "xor".to_string(),
        });
        assert_eq!(err.kind, ErrorKind::Spec(SpecErrorKind::Invalid));
        assert_eq!(err.origin, ErrorOrigin::Spec);
        assert_eq!(err.message, "unknown having spec type 'xor'");

        let err = Error::from(InvalidSpecError::TooDeep { max: 4 });
        assert_eq!(err.kind, ErrorKind::Spec(SpecErrorKind::LimitExceeded));

        let err = Error::from(InvalidSpecError::Json {
            message: "EOF".to_string(),
        });
        assert_eq!(err.kind, ErrorKind::Spec(SpecErrorKind::Malformed));
        assert_eq!(err.origin, ErrorOrigin::Serialize);
    }

    #[test]
    fn missing_metric_is_an_execution_error() {
        let err = Error::from(EvalError::MissingField {
            field: "rows".to_string(),
        });

        assert_eq!(
            err.kind,
            ErrorKind::Execution(ExecutionErrorKind::MissingMetric)
        );
        assert_eq!(err.origin, ErrorOrigin::Eval);
        assert_eq!(err.to_string(), "row has no metric named 'rows'");
        assert!(!err.is_retryable());
    }

    #[test]
    fn config_errors_keep_their_message() {
        let core_err = HavingConfig::from_toml_str("max_depth = 0").unwrap_err();
        let err = Error::from(core_err);

        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.origin, ErrorOrigin::Config);
        assert!(err.message.contains("max_depth"));
        assert_eq!(err.origin.to_string(), "Config");
    }
}
