//! Token indexer descriptors.
//!
//! An indexer turns tokens of one input channel into ids within a vocabulary
//! namespace. The embedder keyed by the same channel name consumes those ids.

use serde_json::json;

use super::resource::PretrainedResource;
use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params};

/// Per-channel token indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenIndexer {
    /// One id per token.
    SingleId {
        namespace: String,
        lowercase_tokens: bool,
    },
    /// One id per character, padded per token.
    Characters {
        namespace: String,
        min_padding_length: usize,
    },
    /// Wordpiece ids from a pretrained subword vocabulary.
    BertPretrained {
        vocab: PretrainedResource,
        namespace: String,
        do_lowercase: bool,
    },
    /// ELMo's fixed character encoding.
    ElmoCharacters { namespace: String },
}

impl TokenIndexer {
    /// Construct a `single_id` indexer.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] when a field is mistyped.
    pub fn single_id(params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::SingleId {
            namespace: params.str_or("namespace", "tokens")?.to_owned(),
            lowercase_tokens: params.bool_or("lowercase_tokens", false)?,
        })
    }

    /// Construct a `characters` indexer.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] when a field is mistyped.
    pub fn characters(params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::Characters {
            namespace: params.str_or("namespace", "token_characters")?.to_owned(),
            min_padding_length: params.usize_or("min_padding_length", 0)?,
        })
    }

    /// Construct a `bert-pretrained` indexer.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] when `pretrained_model` is missing or
    /// a field is mistyped.
    pub fn bert_pretrained(params: &Params<'_>) -> Result<Self, ConfigError> {
        let mut vocab = PretrainedResource::parse(params.str("pretrained_model")?);
        if let Some(digest) = params.opt_str("sha256")? {
            vocab = vocab.with_sha256(digest);
        }
        Ok(Self::BertPretrained {
            vocab,
            namespace: params.str_or("namespace", "bert")?.to_owned(),
            do_lowercase: params.bool_or("do_lowercase", true)?,
        })
    }

    /// Construct an `elmo_characters` indexer.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] when a field is mistyped.
    pub fn elmo_characters(params: &Params<'_>) -> Result<Self, ConfigError> {
        Ok(Self::ElmoCharacters {
            namespace: params.str_or("namespace", "elmo")?.to_owned(),
        })
    }

    /// The vocabulary namespace this indexer writes ids into.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::SingleId { namespace, .. }
            | Self::Characters { namespace, .. }
            | Self::BertPretrained { namespace, .. }
            | Self::ElmoCharacters { namespace } => namespace,
        }
    }

    /// Re-emit the spec this indexer was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match self {
            Self::SingleId {
                namespace,
                lowercase_tokens,
            } => ComponentSpec::new("single_id")
                .with("namespace", namespace.clone())
                .with("lowercase_tokens", *lowercase_tokens),
            Self::Characters {
                namespace,
                min_padding_length,
            } => ComponentSpec::new("characters")
                .with("namespace", namespace.clone())
                .with("min_padding_length", *min_padding_length),
            Self::BertPretrained {
                vocab,
                namespace,
                do_lowercase,
            } => {
                let mut spec = ComponentSpec::new("bert-pretrained")
                    .with("pretrained_model", vocab.location.as_str())
                    .with("namespace", namespace.clone())
                    .with("do_lowercase", *do_lowercase);
                if let Some(digest) = &vocab.sha256 {
                    spec = spec.with("sha256", json!(digest));
                }
                spec
            }
            Self::ElmoCharacters { namespace } => {
                ComponentSpec::new("elmo_characters").with("namespace", namespace.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentRegistry;
    use rstest::rstest;

    #[rstest]
    #[case(ComponentSpec::new("single_id"), "tokens")]
    #[case(ComponentSpec::new("characters"), "token_characters")]
    #[case(
        ComponentSpec::new("bert-pretrained").with("pretrained_model", "vocab/bert.txt"),
        "bert"
    )]
    #[case(ComponentSpec::new("elmo_characters"), "elmo")]
    fn default_namespaces(#[case] spec: ComponentSpec, #[case] namespace: &str) {
        let registry = ComponentRegistry::default();
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let indexer = registry
            .indexer(&spec, "dataset_reader.source_token_indexers.x")
            .expect("resolve indexer");
        assert_eq!(indexer.namespace(), namespace);
    }

    #[rstest]
    fn bert_indexer_requires_a_vocabulary() {
        let spec = ComponentSpec::new("bert-pretrained");
        let err = TokenIndexer::bert_pretrained(
            &spec.params_at("dataset_reader.source_token_indexers.bert"),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("dataset_reader.source_token_indexers.bert.pretrained_model"));
    }

    #[rstest]
    fn spec_round_trips() {
        let spec = ComponentSpec::new("bert-pretrained")
            .with("pretrained_model", "https://example.org/bert-vocab.txt")
            .with("sha256", "abc123");
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let indexer = TokenIndexer::bert_pretrained(&spec.params_at("x")).expect("resolve indexer");
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let back = TokenIndexer::bert_pretrained(&indexer.to_spec().params_at("x"))
            .expect("re-resolve indexer");
        assert_eq!(back, indexer);
    }
}
