use std::fmt;
use thiserror::Error as ThisError;

///
/// InvalidSpecError
///
/// A HAVING specification could not be assembled into a predicate tree.
/// Raised before any row is processed; the query is rejected as invalid.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum InvalidSpecError {
    #[error("having spec must be a JSON object")]
    NotAnObject,

    #[error("having spec is missing its 'type' discriminator")]
    MissingType,

    #[error("unknown having spec type '{found}'")]
    UnknownType { found: String },

    #[error("having spec '{spec_type}' is missing required field '{field}'")]
    MissingField {
        spec_type: &'static str,
        field: &'static str,
    },

    #[error("having spec '{spec_type}' field '{field}' must be {expected}")]
    WrongShape {
        spec_type: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("'not' requires exactly one child spec, found {found}")]
    NotArity { found: usize },

    #[error("comparison aggregation name must not be empty")]
    EmptyField,

    #[error("comparison threshold for '{field}' must be a finite number")]
    NonFiniteThreshold { field: String },

    #[error("having spec nesting exceeds the maximum depth of {max}")]
    TooDeep { max: usize },

    #[error("having spec combinator has {found} children, maximum is {max}")]
    TooManyChildren { max: usize, found: usize },

    #[error("aggregation name is {found} bytes long, maximum is {max}")]
    FieldTooLong { max: usize, found: usize },

    #[error("having spec is not valid JSON: {message}")]
    Json { message: String },
}

impl InvalidSpecError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Json { .. } => ErrorOrigin::Serialize,
            _ => ErrorOrigin::Spec,
        }
    }
}

impl From<serde_json::Error> for InvalidSpecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

///
/// EvalError
///
/// Failure while evaluating a predicate against one aggregated row.
/// A missing metric means the predicate and the aggregation disagree,
/// so it is surfaced instead of being read as a non-match.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalError {
    #[error("row has no metric named '{field}'")]
    MissingField { field: String },
}

impl EvalError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Execution
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Eval
    }
}

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid having config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("having config limit '{name}' must be greater than zero")]
    ZeroLimit { name: &'static str },
}

impl ConfigError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Config
    }
}

///
/// ErrorClass
/// Classification shared by every engine error. None of them are transient.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Validation,
    Execution,
    Configuration,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Execution => "execution",
            Self::Configuration => "configuration",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Eval,
    Serialize,
    Spec,
}

///
/// TESTS
///
