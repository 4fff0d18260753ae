//! Orchestrator configuration with accumulating validation.
//!
//! Validation uses Stillwater's `Validation` type so that every broken rule
//! is reported in one pass instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use knot::config::{ConfigViolation, OrchestratorConfig};
//! use stillwater::validation::Validation;
//!
//! let config = OrchestratorConfig {
//!     name: String::new(),
//!     history_capacity: 1_000_000,
//! };
//!
//! match config.validate() {
//!     Validation::Failure(violations) => assert_eq!(violations.len(), 2),
//!     Validation::Success(_) => panic!("expected violations"),
//! }
//! ```

mod violations;

pub use violations::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Longest accepted orchestrator name.
pub const MAX_NAME_LEN: usize = 64;

/// Largest accepted transition journal.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

/// Per-instance orchestrator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Name used in log fields and error messages
    pub name: String,
    /// Number of transitions kept in the journal; 0 disables it
    pub history_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "knot".to_string(),
            history_capacity: 0,
        }
    }
}

impl OrchestratorConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse from JSON and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let checks: Vec<Check> = vec![
            self.check_name_present(),
            self.check_name_length(),
            self.check_name_characters(),
            self.check_history_capacity(),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// `self` if valid, otherwise every violation.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(violations) => {
                Err(ConfigError::Invalid(violations.iter().cloned().collect()))
            }
        }
    }

    fn check_name_present(&self) -> Check {
        if self.name.is_empty() {
            Validation::fail(ConfigViolation::EmptyName)
        } else {
            Validation::success(())
        }
    }

    fn check_name_length(&self) -> Check {
        let len = self.name.chars().count();
        if len > MAX_NAME_LEN {
            Validation::fail(ConfigViolation::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            })
        } else {
            Validation::success(())
        }
    }

    fn check_name_characters(&self) -> Check {
        if self
            .name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            Validation::fail(ConfigViolation::InvalidNameCharacters)
        } else {
            Validation::success(())
        }
    }

    fn check_history_capacity(&self) -> Check {
        if self.history_capacity > MAX_HISTORY_CAPACITY {
            Validation::fail(ConfigViolation::HistoryTooLarge {
                capacity: self.history_capacity,
                max: MAX_HISTORY_CAPACITY,
            })
        } else {
            Validation::success(())
        }
    }
}
