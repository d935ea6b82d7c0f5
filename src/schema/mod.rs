//! Configuration schema for a CopyNet experiment document.
//!
//! One strongly-typed record per document section, with explicit defaults.
//! Parsing a document produces these records; section-local structural rules
//! live in `validate` methods so every problem in a section is reported, not
//! just the first.

mod data;
mod model;
mod trainer;
mod vocabulary;

pub use data::{IteratorConfig, IteratorKind};
pub use model::{EmbedderConfig, ModelConfig, ModelFamily};
pub use trainer::TrainerConfig;
pub use vocabulary::VocabularyConfig;

use serde::{Deserialize, Serialize};

use crate::params::{ComponentSpec, SchemaError};

/// Root experiment configuration: the Parsed stage of the pipeline.
///
/// Immutable once constructed; nothing mutates a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub dataset_reader: ComponentSpec,
    pub train_data_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_data_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets_for_vocab_creation: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<VocabularyConfig>,
    pub model: ModelConfig,
    pub iterator: IteratorConfig,
    pub trainer: TrainerConfig,
}

impl ExperimentConfig {
    /// Parse a configuration document, tolerating `//` and `/* */` comments.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] naming the offending section or field when
    /// the document is malformed or a section does not match its schema.
    pub fn from_json_str(document: &str) -> Result<Self, SchemaError> {
        crate::document::parse_document(document)
    }

    /// Read and parse a configuration document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] when the file cannot be read and
    /// otherwise behaves like [`ExperimentConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|source| SchemaError::Malformed(format!("{}: {source}", path.display())))?;
        Self::from_json_str(&document)
    }

    /// Section-local structural checks, aggregated across the document.
    pub(crate) fn validate_structure(&self, errors: &mut Vec<SchemaError>) {
        if self.train_data_path.trim().is_empty() {
            errors.push(SchemaError::invalid(
                "train_data_path",
                "must not be empty",
            ));
        }
        if let Some(datasets) = &self.datasets_for_vocab_creation {
            for name in datasets {
                if name != "train" && name != "validation" {
                    errors.push(SchemaError::invalid(
                        "datasets_for_vocab_creation",
                        format!("unknown dataset \"{name}\" (expected \"train\" or \"validation\")"),
                    ));
                }
            }
        }
        if let Some(vocabulary) = &self.vocabulary {
            vocabulary.validate_structure(errors);
        }
        self.model.validate_structure(errors);
        self.iterator.validate_structure(errors);
        self.trainer.validate_structure(errors);
    }
}
