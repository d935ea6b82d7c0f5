//! Trainer section of the experiment schema.

use serde::{Deserialize, Serialize};

use crate::params::{ComponentSpec, SchemaError};

fn default_cuda_device() -> i64 {
    -1
}

fn default_validation_metric() -> String {
    "-loss".to_owned()
}

fn default_shuffle() -> bool {
    true
}

/// Trainer policy: optimizer, scheduler, epochs, device, and logging flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerConfig {
    pub optimizer: ComponentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate_scheduler: Option<ComponentSpec>,
    pub num_epochs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patience: Option<usize>,
    /// Device selector; `-1` trains on CPU, `n >= 0` selects a GPU.
    #[serde(default = "default_cuda_device")]
    pub cuda_device: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad_norm: Option<f64>,
    /// Metric to track for early stopping, prefixed with `+` (higher is
    /// better) or `-` (lower is better).
    #[serde(default = "default_validation_metric")]
    pub validation_metric: String,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub should_log_learning_rate: bool,
    #[serde(default)]
    pub should_log_parameter_statistics: bool,
}

impl TrainerConfig {
    pub(crate) fn validate_structure(&self, errors: &mut Vec<SchemaError>) {
        if self.num_epochs == 0 {
            errors.push(SchemaError::invalid(
                "trainer.num_epochs",
                "must be at least 1",
            ));
        }
        if self.patience == Some(0) {
            errors.push(SchemaError::invalid(
                "trainer.patience",
                "must be at least 1 when present",
            ));
        }
        if self.cuda_device < -1 {
            errors.push(SchemaError::invalid(
                "trainer.cuda_device",
                format!("must be -1 (CPU) or a device ordinal but was {}", self.cuda_device),
            ));
        }
        if let Some(norm) = self.grad_norm {
            if !norm.is_finite() || norm <= 0.0 {
                errors.push(SchemaError::invalid(
                    "trainer.grad_norm",
                    format!("must be a positive number but was {norm}"),
                ));
            }
        }
        let metric = self.validation_metric.as_str();
        if metric.len() < 2 || !(metric.starts_with('+') || metric.starts_with('-')) {
            errors.push(SchemaError::invalid(
                "trainer.validation_metric",
                "must be a metric name prefixed with '+' or '-'",
            ));
        }
    }
}
