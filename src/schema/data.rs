//! Iterator (batching policy) section of the experiment schema.

use serde::{Deserialize, Serialize};

use crate::params::SchemaError;

/// Batching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IteratorKind {
    /// Group instances of similar length to minimise padding.
    Bucket,
    /// Fixed-size batches in dataset order.
    Basic,
}

fn default_kind() -> IteratorKind {
    IteratorKind::Bucket
}

/// Batching policy: batch size, bucket sorting, and in-memory caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IteratorConfig {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: IteratorKind,
    pub batch_size: usize,
    /// `(field, padding key)` pairs; fields must exist in the dataset schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorting_keys: Vec<(String, String)>,
    #[serde(default)]
    pub padding_noise: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances_per_epoch: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances_in_memory: Option<usize>,
}

impl IteratorConfig {
    pub(crate) fn validate_structure(&self, errors: &mut Vec<SchemaError>) {
        if self.batch_size == 0 {
            errors.push(SchemaError::invalid(
                "iterator.batch_size",
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.padding_noise) {
            errors.push(SchemaError::invalid(
                "iterator.padding_noise",
                format!("must lie in [0, 1] but was {}", self.padding_noise),
            ));
        }
        if self.kind == IteratorKind::Bucket && self.sorting_keys.is_empty() {
            errors.push(SchemaError::invalid(
                "iterator.sorting_keys",
                "a bucket iterator requires at least one sorting key",
            ));
        }
        if self.instances_per_epoch == Some(0) {
            errors.push(SchemaError::invalid(
                "iterator.instances_per_epoch",
                "must be at least 1 when present",
            ));
        }
        if self.max_instances_in_memory == Some(0) {
            errors.push(SchemaError::invalid(
                "iterator.max_instances_in_memory",
                "must be at least 1 when present",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bucket_iterator() -> IteratorConfig {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        serde_json::from_value(serde_json::json!({
            "type": "bucket",
            "batch_size": 32,
            "sorting_keys": [["source_tokens", "num_tokens"]],
            "padding_noise": 0.2
        }))
        .expect("deserialise iterator")
    }

    #[rstest]
    fn bucket_iterator_deserialises() {
        let iterator = bucket_iterator();
        assert_eq!(iterator.kind, IteratorKind::Bucket);
        assert_eq!(
            iterator.sorting_keys,
            vec![("source_tokens".to_owned(), "num_tokens".to_owned())]
        );
        assert!(iterator.validate_ok());
    }

    #[rstest]
    #[case(serde_json::json!({ "batch_size": 0, "sorting_keys": [["source_tokens", "num_tokens"]] }), "iterator.batch_size")]
    #[case(serde_json::json!({ "batch_size": 8, "sorting_keys": [["source_tokens", "num_tokens"]], "padding_noise": 1.5 }), "iterator.padding_noise")]
    #[case(serde_json::json!({ "batch_size": 8 }), "iterator.sorting_keys")]
    #[case(serde_json::json!({ "batch_size": 8, "sorting_keys": [["source_tokens", "num_tokens"]], "instances_per_epoch": 0 }), "iterator.instances_per_epoch")]
    fn structural_violations_name_the_field(
        #[case] json: serde_json::Value,
        #[case] path: &str,
    ) {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let iterator: IteratorConfig = serde_json::from_value(json).expect("deserialise iterator");
        let mut errors = Vec::new();
        iterator.validate_structure(&mut errors);
        assert!(errors
            .iter()
            .any(|e| matches!(e, SchemaError::Invalid { path: p, .. } if p == path)));
    }

    #[rstest]
    fn unknown_field_is_rejected() {
        let result: Result<IteratorConfig, _> = serde_json::from_value(serde_json::json!({
            "batch_size": 8,
            "sorting_keys": [["source_tokens", "num_tokens"]],
            "bucket_width": 4
        }));
        assert!(result.is_err());
    }

    impl IteratorConfig {
        fn validate_ok(&self) -> bool {
            let mut errors = Vec::new();
            self.validate_structure(&mut errors);
            errors.is_empty()
        }
    }
}
