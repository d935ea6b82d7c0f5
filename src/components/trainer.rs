//! Optimizer and learning-rate scheduler descriptors.

use serde_json::json;

use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params, SchemaError};

/// Gradient descent policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Optimizer {
    Sgd { lr: f64, momentum: f64 },
    Adam { lr: f64 },
}

impl Optimizer {
    /// Construct an `sgd` optimizer.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when `lr` is missing, mistyped, or not a
    /// positive number.
    pub fn sgd(params: &Params<'_>) -> Result<Self, ConfigError> {
        let lr = positive_lr(params)?;
        let momentum = params.f64_or("momentum", 0.0)?;
        if !(0.0..1.0).contains(&momentum) {
            return Err(SchemaError::invalid(
                params.field_path("momentum"),
                format!("must lie in [0, 1) but was {momentum}"),
            )
            .into());
        }
        Ok(Self::Sgd { lr, momentum })
    }

    /// Construct an `adam` optimizer.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when `lr` is missing, mistyped, or not a
    /// positive number.
    pub fn adam(params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::Adam {
            lr: positive_lr(params)?,
        })
    }

    /// The configured learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        match *self {
            Self::Sgd { lr, .. } | Self::Adam { lr } => lr,
        }
    }

    /// Re-emit the spec this optimizer was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match *self {
            Self::Sgd { lr, momentum } => ComponentSpec::new("sgd")
                .with("lr", json!(lr))
                .with("momentum", json!(momentum)),
            Self::Adam { lr } => ComponentSpec::new("adam").with("lr", json!(lr)),
        }
    }
}

fn positive_lr(params: &Params<'_>) -> Result<f64, ConfigError> {
    let lr = params.f64("lr")?;
    if !lr.is_finite() || lr <= 0.0 {
        return Err(SchemaError::invalid(
            params.field_path("lr"),
            format!("must be a positive number but was {lr}"),
        )
        .into());
    }
    Ok(lr)
}

/// Learning-rate schedule applied across epochs.
#[derive(Debug, Clone, PartialEq)]
pub enum LrScheduler {
    /// Cosine annealing with warm restarts.
    Cosine {
        t_initial: usize,
        t_mul: f64,
        eta_mul: f64,
    },
}

impl LrScheduler {
    /// Construct a `cosine` scheduler.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when `t_initial` is missing or zero, or a
    /// multiplier is not a positive number.
    pub fn cosine(params: &Params<'_>) -> Result<Self, ConfigError> {
        let t_initial = params.usize("t_initial")?;
        if t_initial == 0 {
            return Err(
                SchemaError::invalid(params.field_path("t_initial"), "must be at least 1").into(),
            );
        }
        let t_mul = params.f64_or("t_mul", 1.0)?;
        let eta_mul = params.f64_or("eta_mul", 1.0)?;
        for (key, value) in [("t_mul", t_mul), ("eta_mul", eta_mul)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SchemaError::invalid(
                    params.field_path(key),
                    format!("must be a positive number but was {value}"),
                )
                .into());
            }
        }
        Ok(Self::Cosine {
            t_initial,
            t_mul,
            eta_mul,
        })
    }

    /// Re-emit the spec this scheduler was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match *self {
            Self::Cosine {
                t_initial,
                t_mul,
                eta_mul,
            } => ComponentSpec::new("cosine")
                .with("t_initial", t_initial)
                .with("t_mul", json!(t_mul))
                .with("eta_mul", json!(eta_mul)),
        }
    }
}
