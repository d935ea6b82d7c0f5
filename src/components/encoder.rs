//! Sequence-to-sequence encoder descriptors.

use serde_json::json;

use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params, SchemaError};

/// Encoder over the embedded source sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Seq2SeqEncoder {
    /// Multi-layer (optionally bidirectional) LSTM.
    Lstm {
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        dropout: f64,
        bidirectional: bool,
    },
}

impl Seq2SeqEncoder {
    /// Construct an LSTM encoder from a parameter block.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] naming the offending field when a required
    /// field is missing, mistyped, or out of range.
    pub fn lstm(params: &Params<'_>) -> Result<Self, ConfigError> {
        let input_size = params.usize("input_size")?;
        let hidden_size = params.usize("hidden_size")?;
        let num_layers = params.usize_or("num_layers", 1)?;
        let dropout = params.f64_or("dropout", 0.0)?;
        let bidirectional = params.bool_or("bidirectional", false)?;
        if input_size == 0 {
            return Err(SchemaError::invalid(params.field_path("input_size"), "must be at least 1").into());
        }
        if hidden_size == 0 {
            return Err(
                SchemaError::invalid(params.field_path("hidden_size"), "must be at least 1").into(),
            );
        }
        if num_layers == 0 {
            return Err(
                SchemaError::invalid(params.field_path("num_layers"), "must be at least 1").into(),
            );
        }
        if !(0.0..1.0).contains(&dropout) {
            return Err(SchemaError::invalid(
                params.field_path("dropout"),
                format!("must lie in [0, 1) but was {dropout}"),
            )
            .into());
        }
        Ok(Self::Lstm {
            input_size,
            hidden_size,
            num_layers,
            dropout,
            bidirectional,
        })
    }

    /// Width of the vectors this encoder consumes.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        match *self {
            Self::Lstm { input_size, .. } => input_size,
        }
    }

    /// Width of the vectors this encoder produces: the hidden size, doubled
    /// when bidirectional.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        match *self {
            Self::Lstm {
                hidden_size,
                bidirectional,
                ..
            } => {
                if bidirectional {
                    hidden_size * 2
                } else {
                    hidden_size
                }
            }
        }
    }

    /// Re-emit the spec this encoder was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match *self {
            Self::Lstm {
                input_size,
                hidden_size,
                num_layers,
                dropout,
                bidirectional,
            } => ComponentSpec::new("lstm")
                .with("input_size", input_size)
                .with("hidden_size", hidden_size)
                .with("num_layers", num_layers)
                .with("dropout", json!(dropout))
                .with("bidirectional", bidirectional),
        }
    }
}
