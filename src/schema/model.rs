//! Model section of the experiment schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::{ComponentSpec, SchemaError};

fn default_target_embedding_dim() -> usize {
    30
}

fn default_copy_token() -> String {
    "@COPY@".to_owned()
}

fn default_source_namespace() -> String {
    "source_tokens".to_owned()
}

fn default_target_namespace() -> String {
    "target_tokens".to_owned()
}

/// Model family selector. Chooses between the plain CopyNet reader/model
/// pairing and the constant-annotated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Copynet,
    CopynetConst,
}

/// Named set of per-channel token embedder specs.
///
/// `allow_unmatched_keys` is deliberately required: the source corpus was
/// inconsistent about whether embedder keys without a matching indexer are
/// permitted, so the document must say so explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderConfig {
    pub allow_unmatched_keys: bool,
    pub token_embedders: BTreeMap<String, ComponentSpec>,
}

/// Model section: encoder/decoder shape, decoding policy, and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub family: ModelFamily,
    pub source_embedder: EmbedderConfig,
    pub encoder: ComponentSpec,
    pub attention: ComponentSpec,
    #[serde(default = "default_target_embedding_dim")]
    pub target_embedding_dim: usize,
    pub beam_size: usize,
    pub max_decoding_steps: usize,
    #[serde(default = "default_copy_token")]
    pub copy_token: String,
    #[serde(default = "default_source_namespace")]
    pub source_namespace: String,
    #[serde(default = "default_target_namespace")]
    pub target_namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<ComponentSpec>,
}

impl ModelConfig {
    pub(crate) fn validate_structure(&self, errors: &mut Vec<SchemaError>) {
        if self.source_embedder.token_embedders.is_empty() {
            errors.push(SchemaError::invalid(
                "model.source_embedder.token_embedders",
                "at least one embedder channel is required",
            ));
        }
        if self.copy_token.is_empty() {
            errors.push(SchemaError::invalid(
                "model.copy_token",
                "must not be empty",
            ));
        }
        if self.source_namespace == self.target_namespace {
            errors.push(SchemaError::invalid(
                "model.target_namespace",
                "source and target namespaces must differ",
            ));
        }
    }
}
