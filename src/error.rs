//! Umbrella error for every resolution stage.

use thiserror::Error;

use crate::experiment::PathNotFoundError;
use crate::params::SchemaError;
use crate::registry::UnknownTypeError;
use crate::validate::ConsistencyError;

#[cfg(feature = "fetch")]
use crate::fetch::ResourceUnavailableError;

/// Any failure while parsing, validating, or resolving a configuration.
///
/// Stages that can surface several independent problems aggregate them under
/// [`ConfigError::Multiple`] so one failed run reports everything at once.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error(transparent)]
    PathNotFound(#[from] PathNotFoundError),
    #[cfg(feature = "fetch")]
    #[error(transparent)]
    ResourceUnavailable(#[from] ResourceUnavailableError),
    #[error("configuration is invalid:{}", format_errors(.0))]
    Multiple(Vec<ConfigError>),
}

impl ConfigError {
    /// Collapse a non-empty error list: a single error stays itself, more
    /// become [`ConfigError::Multiple`].
    ///
    /// # Panics
    ///
    /// Panics when `errors` is empty; callers only aggregate after checking.
    #[must_use]
    pub(crate) fn aggregate(mut errors: Vec<ConfigError>) -> Self {
        assert!(!errors.is_empty(), "aggregate requires at least one error");
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Multiple(errors)
        }
    }

    /// Every leaf error, with `Multiple` flattened away.
    #[must_use]
    pub fn flatten(&self) -> Vec<&ConfigError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(ConfigError::flatten).collect(),
            other => vec![other],
        }
    }
}

fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|error| format!("\n  - {error}"))
        .collect()
}
