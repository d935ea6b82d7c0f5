//! Vocabulary section of the experiment schema.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::params::SchemaError;

/// Vocabulary construction policy.
///
/// Either loaded from a previously serialised directory, or built from the
/// training instances with optional per-namespace pruning thresholds and
/// injected tokens. A namespace absent from `min_count` is kept unpruned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_path: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub min_count: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens_to_add: BTreeMap<String, Vec<String>>,
}

impl VocabularyConfig {
    /// Whether the vocabulary is loaded from disk rather than built from
    /// instances.
    #[must_use]
    pub fn is_from_directory(&self) -> bool {
        self.directory_path.is_some()
    }

    /// Namespaces given an explicit threshold or injected tokens.
    #[must_use]
    pub fn declared_namespaces(&self) -> BTreeSet<&str> {
        self.min_count
            .keys()
            .chain(self.tokens_to_add.keys())
            .map(String::as_str)
            .collect()
    }

    pub(crate) fn validate_structure(&self, errors: &mut Vec<SchemaError>) {
        if let Some(path) = &self.directory_path {
            if path.trim().is_empty() {
                errors.push(SchemaError::invalid(
                    "vocabulary.directory_path",
                    "must not be empty when present",
                ));
            }
            if !self.min_count.is_empty() || !self.tokens_to_add.is_empty() {
                errors.push(SchemaError::invalid(
                    "vocabulary.directory_path",
                    "a directory vocabulary cannot also declare min_count or tokens_to_add",
                ));
            }
        }
        for (namespace, count) in &self.min_count {
            if *count == 0 {
                errors.push(SchemaError::invalid(
                    format!("vocabulary.min_count.{namespace}"),
                    "must be at least 1; omit the namespace to disable pruning",
                ));
            }
        }
        for (namespace, tokens) in &self.tokens_to_add {
            if tokens.is_empty() {
                errors.push(SchemaError::invalid(
                    format!("vocabulary.tokens_to_add.{namespace}"),
                    "must list at least one token when present",
                ));
            }
        }
    }
}
