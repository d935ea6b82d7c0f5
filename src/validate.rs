//! Cross-field consistency checks.
//!
//! Runs after every component spec has resolved. Every violated constraint
//! is collected into one [`ConsistencyError`] so a single failed run
//! surfaces all problems at once; reporting only the first would force a
//! fix-rerun loop per mistake.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::components::TokenEmbedder;
use crate::experiment::ResolvedComponents;
use crate::schema::ExperimentConfig;

/// One violated cross-field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("model.encoder.input_size is {encoder_input_size} but model.source_embedder output widths sum to {embedder_width}")]
    EmbedderWidth {
        embedder_width: usize,
        encoder_input_size: usize,
    },
    #[error("model.attention.vector_dim is {vector_dim} but the encoder output width is {encoder_output_dim}")]
    AttentionVectorDim {
        vector_dim: usize,
        encoder_output_dim: usize,
    },
    #[error("model.attention.matrix_dim is {matrix_dim} but the encoder output width is {encoder_output_dim}")]
    AttentionMatrixDim {
        matrix_dim: usize,
        encoder_output_dim: usize,
    },
    #[error("{path} must be at least 1")]
    BelowMinimum { path: &'static str },
    #[error("model.source_embedder.token_embedders.{key} has no matching token indexer (set allow_unmatched_keys to permit this)")]
    UnmatchedEmbedderKey { key: String },
    #[error("dataset_reader.source_token_indexers.{key} has no matching token embedder (set allow_unmatched_keys to permit this)")]
    UnmatchedIndexerKey { key: String },
    #[error("model.source_embedder.token_embedders.{key}: inner encoder input_size is {encoder_input_size} but embedding_dim is {embedding_dim}")]
    CharacterEncoderWidth {
        key: String,
        embedding_dim: usize,
        encoder_input_size: usize,
    },
    #[error("iterator.sorting_keys references field \"{field}\" but the reader produces [{available}]")]
    UnknownSortingField { field: String, available: String },
    #[error("vocabulary declares namespace \"{namespace}\" but no indexer or embedder references it")]
    DanglingNamespace { namespace: String },
}

/// Batched report of every violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", format_violations(.violations))]
pub struct ConsistencyError {
    pub violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    let mut rendered = format!(
        "configuration failed {} consistency check(s):",
        violations.len()
    );
    for violation in violations {
        rendered.push_str(&format!("\n  - {violation}"));
    }
    rendered
}

/// Check every cross-field constraint and return all violations.
pub(crate) fn check_consistency(
    config: &ExperimentConfig,
    parts: &ResolvedComponents,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let embedder_width = parts.source_embedder.total_output_dim();
    let encoder_input_size = parts.encoder.input_dim();
    if embedder_width != encoder_input_size {
        violations.push(Violation::EmbedderWidth {
            embedder_width,
            encoder_input_size,
        });
    }

    let encoder_output_dim = parts.encoder.output_dim();
    if parts.attention.vector_dim() != encoder_output_dim {
        violations.push(Violation::AttentionVectorDim {
            vector_dim: parts.attention.vector_dim(),
            encoder_output_dim,
        });
    }
    if parts.attention.matrix_dim() != encoder_output_dim {
        violations.push(Violation::AttentionMatrixDim {
            matrix_dim: parts.attention.matrix_dim(),
            encoder_output_dim,
        });
    }

    for (path, value) in [
        ("model.target_embedding_dim", config.model.target_embedding_dim),
        ("model.beam_size", config.model.beam_size),
        ("model.max_decoding_steps", config.model.max_decoding_steps),
    ] {
        if value == 0 {
            violations.push(Violation::BelowMinimum { path });
        }
    }

    if !parts.source_embedder.allow_unmatched_keys {
        let indexer_keys: BTreeSet<&str> = parts
            .reader
            .source_token_indexers
            .keys()
            .map(String::as_str)
            .collect();
        let embedder_keys: BTreeSet<&str> = parts
            .source_embedder
            .embedders
            .keys()
            .map(String::as_str)
            .collect();
        for key in embedder_keys.difference(&indexer_keys) {
            violations.push(Violation::UnmatchedEmbedderKey {
                key: (*key).to_owned(),
            });
        }
        for key in indexer_keys.difference(&embedder_keys) {
            violations.push(Violation::UnmatchedIndexerKey {
                key: (*key).to_owned(),
            });
        }
    }

    for (key, embedder) in &parts.source_embedder.embedders {
        if let TokenEmbedder::CharacterEncoding {
            embedding_dim,
            encoder,
        } = embedder
        {
            if encoder.input_dim() != *embedding_dim {
                violations.push(Violation::CharacterEncoderWidth {
                    key: key.clone(),
                    embedding_dim: *embedding_dim,
                    encoder_input_size: encoder.input_dim(),
                });
            }
        }
    }

    let reader_fields = parts.reader.fields();
    for (field, _padding_key) in &config.iterator.sorting_keys {
        if !reader_fields.contains(&field.as_str()) {
            violations.push(Violation::UnknownSortingField {
                field: field.clone(),
                available: reader_fields.join(", "),
            });
        }
    }

    if let Some(vocabulary) = &config.vocabulary {
        if !vocabulary.is_from_directory() {
            let mut referenced: BTreeSet<&str> = parts
                .reader
                .source_token_indexers
                .values()
                .map(crate::components::TokenIndexer::namespace)
                .collect();
            referenced.extend(
                parts
                    .source_embedder
                    .embedders
                    .values()
                    .filter_map(TokenEmbedder::vocab_namespace),
            );
            referenced.insert(&parts.reader.target_namespace);
            referenced.insert(&config.model.source_namespace);
            referenced.insert(&config.model.target_namespace);
            for namespace in vocabulary.declared_namespaces() {
                if !referenced.contains(namespace) {
                    violations.push(Violation::DanglingNamespace {
                        namespace: namespace.to_owned(),
                    });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::minimal_config;
    use crate::experiment::resolve_components;
    use crate::registry::ComponentRegistry;
    use rstest::rstest;

    fn check(config: &ExperimentConfig) -> Vec<Violation> {
        let registry = ComponentRegistry::default();
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let parts = resolve_components(config, &registry)
            .map_err(|errors| format!("{errors:?}"))
            .expect("resolve components");
        check_consistency(config, &parts)
    }

    #[rstest]
    fn consistent_document_has_no_violations() {
        assert_eq!(check(&minimal_config()), Vec::new());
    }

    #[rstest]
    fn width_mismatch_names_both_fields() {
        let mut config = minimal_config();
        config.model.encoder = config.model.encoder.clone().with("input_size", 99);
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![Violation::EmbedderWidth {
                embedder_width: 100,
                encoder_input_size: 99,
            }]
        );
    }

    #[rstest]
    fn both_attention_dims_are_reported_together() {
        let mut config = minimal_config();
        config.model.attention = config
            .model
            .attention
            .clone()
            .with("vector_dim", 100)
            .with("matrix_dim", 150);
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![
                Violation::AttentionVectorDim {
                    vector_dim: 100,
                    encoder_output_dim: 200,
                },
                Violation::AttentionMatrixDim {
                    matrix_dim: 150,
                    encoder_output_dim: 200,
                },
            ]
        );
    }

    #[rstest]
    fn beam_size_zero_is_a_boundary_violation() {
        let mut config = minimal_config();
        config.model.beam_size = 0;
        assert_eq!(
            check(&config),
            vec![Violation::BelowMinimum {
                path: "model.beam_size"
            }]
        );
        config.model.beam_size = 1;
        assert_eq!(check(&config), Vec::new());
    }

    #[rstest]
    fn unmatched_embedder_key_is_flagged_unless_allowed() {
        let mut config = minimal_config();
        // A second channel with no matching indexer; widths kept consistent.
        let bert = crate::ComponentSpec::new("bert-pretrained")
            .with("pretrained_model", "weights/bert.tar.gz")
            .with("hidden_dim", 100_usize);
        config
            .model
            .source_embedder
            .token_embedders
            .insert("bert".into(), bert);
        config.model.encoder = config.model.encoder.clone().with("input_size", 200);
        config.model.attention = config
            .model
            .attention
            .clone()
            .with("vector_dim", 200)
            .with("matrix_dim", 200);
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![Violation::UnmatchedEmbedderKey { key: "bert".into() }]
        );

        config.model.source_embedder.allow_unmatched_keys = true;
        assert_eq!(check(&config), Vec::new());
    }

    #[rstest]
    fn character_encoder_width_is_checked() {
        let mut config = minimal_config();
        let chars = crate::ComponentSpec::new("character_encoding")
            .with("embedding_dim", 25_usize)
            .with(
                "encoder",
                serde_json::json!({ "type": "lstm", "input_size": 30, "hidden_size": 50 }),
            );
        config
            .model
            .source_embedder
            .token_embedders
            .insert("token_characters".into(), chars);
        config.model.source_embedder.allow_unmatched_keys = true;
        config.model.encoder = config.model.encoder.clone().with("input_size", 150);
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![Violation::CharacterEncoderWidth {
                key: "token_characters".into(),
                embedding_dim: 25,
                encoder_input_size: 30,
            }]
        );
    }

    #[rstest]
    fn unknown_sorting_field_lists_available_fields() {
        let mut config = minimal_config();
        config
            .iterator
            .sorting_keys
            .push(("source_indices".into(), "num_tokens".into()));
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![Violation::UnknownSortingField {
                field: "source_indices".into(),
                available: "source_tokens, target_tokens".into(),
            }]
        );
    }

    #[rstest]
    fn dangling_vocabulary_namespace_is_flagged() {
        let mut config = minimal_config();
        config.vocabulary = Some(crate::schema::VocabularyConfig {
            directory_path: None,
            min_count: [("byte_pairs".to_owned(), 2)].into_iter().collect(),
            tokens_to_add: Default::default(),
        });
        let violations = check(&config);
        assert_eq!(
            violations,
            vec![Violation::DanglingNamespace {
                namespace: "byte_pairs".into()
            }]
        );
    }
}
