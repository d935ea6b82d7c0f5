//! Evaluation metric descriptors.

use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params};

/// Sequence-level metric computed against gold targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    /// Corpus BLEU over predicted token sequences.
    Bleu,
    /// Exact-match accuracy over whole token sequences.
    TokenSequenceAccuracy,
}

impl Metric {
    /// Construct a `bleu` metric.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for registry uniformity.
    pub fn bleu(_params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::Bleu)
    }

    /// Construct a `token_sequence_accuracy` metric.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for registry uniformity.
    pub fn token_sequence_accuracy(_params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::TokenSequenceAccuracy)
    }

    /// Re-emit the spec this metric was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match self {
            Self::Bleu => ComponentSpec::new("bleu"),
            Self::TokenSequenceAccuracy => ComponentSpec::new("token_sequence_accuracy"),
        }
    }
}
