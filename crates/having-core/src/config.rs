use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

///
/// HavingConfig
///
/// Parse-time limits for HAVING specs. They bound recursion depth and
/// fan-out of caller-supplied specs; evaluation itself is unaffected.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HavingConfig {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_field_len: usize,
}

impl HavingConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_CHILDREN: usize = 1024;
    pub const DEFAULT_MAX_FIELD_LEN: usize = 256;

    /// Limits that accept every tree the builders can construct.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_children: usize::MAX,
            max_field_len: usize::MAX,
        }
    }

    /// Parse limits from a flat TOML document, filling gaps with defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroLimit { name: "max_depth" });
        }
        if self.max_children == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_children",
            });
        }
        if self.max_field_len == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_field_len",
            });
        }

        Ok(())
    }
}

impl Default for HavingConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_children: Self::DEFAULT_MAX_CHILDREN,
            max_field_len: Self::DEFAULT_MAX_FIELD_LEN,
        }
    }
}

///
/// TESTS
///
