//! Attention descriptors.

use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params, SchemaError};

/// Attention over encoder outputs used when scoring generation candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attention {
    /// Bilinear attention `x^T W y` between a vector and a matrix of
    /// encoder states.
    Bilinear { vector_dim: usize, matrix_dim: usize },
}

impl Attention {
    /// Construct bilinear attention from a parameter block.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] naming the offending field when a dimension
    /// is missing, mistyped, or zero.
    pub fn bilinear(params: &Params<'_>) -> Result<Self, ConfigError> {
        let vector_dim = params.usize("vector_dim")?;
        let matrix_dim = params.usize("matrix_dim")?;
        for (key, value) in [("vector_dim", vector_dim), ("matrix_dim", matrix_dim)] {
            if value == 0 {
                return Err(
                    SchemaError::invalid(params.field_path(key), "must be at least 1").into(),
                );
            }
        }
        Ok(Self::Bilinear {
            vector_dim,
            matrix_dim,
        })
    }

    /// Expected width of the decoder-side query vector.
    #[must_use]
    pub fn vector_dim(&self) -> usize {
        match *self {
            Self::Bilinear { vector_dim, .. } => vector_dim,
        }
    }

    /// Expected width of the encoder-side state matrix rows.
    #[must_use]
    pub fn matrix_dim(&self) -> usize {
        match *self {
            Self::Bilinear { matrix_dim, .. } => matrix_dim,
        }
    }

    /// Re-emit the spec this attention was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match *self {
            Self::Bilinear {
                vector_dim,
                matrix_dim,
            } => ComponentSpec::new("bilinear")
                .with("vector_dim", vector_dim)
                .with("matrix_dim", matrix_dim),
        }
    }
}
