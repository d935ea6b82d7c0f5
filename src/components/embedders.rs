//! Token embedder descriptors.
//!
//! One embedder per input channel; each produces vectors of a fixed width.
//! The concatenation of every channel's output feeds the encoder, so each
//! variant must be able to state its width without touching any pretrained
//! artefact.

use std::collections::BTreeMap;

use serde_json::json;

use super::resource::PretrainedResource;
use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params, SchemaError};
use crate::registry::ComponentRegistry;

use super::encoder::Seq2SeqEncoder;

/// Default hidden width of a BERT base model.
const BERT_BASE_HIDDEN_DIM: usize = 768;

/// Default output width of the public ELMo models.
const ELMO_OUTPUT_DIM: usize = 1024;

/// Per-channel token embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenEmbedder {
    /// Trainable lookup table, optionally initialised from a pretrained file.
    Embedding {
        embedding_dim: usize,
        vocab_namespace: String,
        pretrained_file: Option<PretrainedResource>,
        trainable: bool,
    },
    /// Character embeddings pooled by a nested encoder.
    CharacterEncoding {
        embedding_dim: usize,
        encoder: Seq2SeqEncoder,
    },
    /// Frozen or fine-tunable BERT weights.
    BertPretrained {
        model: PretrainedResource,
        hidden_dim: usize,
        requires_grad: bool,
    },
    /// ELMo representations, optionally projected down.
    ElmoTokenEmbedder {
        options_file: PretrainedResource,
        weight_file: PretrainedResource,
        projection_dim: Option<usize>,
        dropout: f64,
        requires_grad: bool,
    },
}

impl TokenEmbedder {
    /// Construct an `embedding` lookup table.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when `embedding_dim` is missing, mistyped,
    /// or zero.
    pub fn embedding(params: &Params<'_>) -> Result<Self, ConfigError> {
        let embedding_dim = params.usize("embedding_dim")?;
        if embedding_dim == 0 {
            return Err(
                SchemaError::invalid(params.field_path("embedding_dim"), "must be at least 1")
                    .into(),
            );
        }
        let pretrained_file = match params.opt_str("pretrained_file")? {
            None => None,
            Some(raw) => {
                let mut resource = PretrainedResource::parse(raw);
                if let Some(digest) = params.opt_str("sha256")? {
                    resource = resource.with_sha256(digest);
                }
                Some(resource)
            }
        };
        Ok(Self::Embedding {
            embedding_dim,
            vocab_namespace: params.str_or("vocab_namespace", "tokens")?.to_owned(),
            pretrained_file,
            trainable: params.bool_or("trainable", true)?,
        })
    }

    /// Construct a `character_encoding` embedder with its nested encoder.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] for missing or mistyped fields and an
    /// [`crate::UnknownTypeError`] when the nested encoder tag is
    /// unregistered.
    pub fn character_encoding(
        registry: &ComponentRegistry,
        params: &Params<'_>,
    ) -> Result<Self, ConfigError> {
        let embedding_dim = params.usize("embedding_dim")?;
        if embedding_dim == 0 {
            return Err(
                SchemaError::invalid(params.field_path("embedding_dim"), "must be at least 1")
                    .into(),
            );
        }
        let (spec, path) = params.spec("encoder")?;
        let encoder = registry.encoder(&spec, &path)?;
        Ok(Self::CharacterEncoding {
            embedding_dim,
            encoder,
        })
    }

    /// Construct a `bert-pretrained` embedder.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when `pretrained_model` is missing or a
    /// field is mistyped.
    pub fn bert_pretrained(params: &Params<'_>) -> Result<Self, ConfigError> {
        let mut model = PretrainedResource::parse(params.str("pretrained_model")?);
        if let Some(digest) = params.opt_str("sha256")? {
            model = model.with_sha256(digest);
        }
        let hidden_dim = params.usize_or("hidden_dim", BERT_BASE_HIDDEN_DIM)?;
        if hidden_dim == 0 {
            return Err(
                SchemaError::invalid(params.field_path("hidden_dim"), "must be at least 1").into(),
            );
        }
        Ok(Self::BertPretrained {
            model,
            hidden_dim,
            requires_grad: params.bool_or("requires_grad", false)?,
        })
    }

    /// Construct an `elmo_token_embedder`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when either artefact reference is missing
    /// or a field is mistyped.
    pub fn elmo(params: &Params<'_>) -> Result<Self, ConfigError> {
        let projection_dim = params.opt_usize("projection_dim")?;
        if projection_dim == Some(0) {
            return Err(SchemaError::invalid(
                params.field_path("projection_dim"),
                "must be at least 1 when present",
            )
            .into());
        }
        let dropout = params.f64_or("dropout", 0.0)?;
        if !(0.0..1.0).contains(&dropout) {
            return Err(SchemaError::invalid(
                params.field_path("dropout"),
                format!("must lie in [0, 1) but was {dropout}"),
            )
            .into());
        }
        Ok(Self::ElmoTokenEmbedder {
            options_file: PretrainedResource::parse(params.str("options_file")?),
            weight_file: PretrainedResource::parse(params.str("weight_file")?),
            projection_dim,
            dropout,
            requires_grad: params.bool_or("requires_grad", false)?,
        })
    }

    /// Width of the vectors this embedder produces.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        match self {
            Self::Embedding { embedding_dim, .. } => *embedding_dim,
            Self::CharacterEncoding { encoder, .. } => encoder.output_dim(),
            Self::BertPretrained { hidden_dim, .. } => *hidden_dim,
            Self::ElmoTokenEmbedder { projection_dim, .. } => {
                projection_dim.unwrap_or(ELMO_OUTPUT_DIM)
            }
        }
    }

    /// The vocabulary namespace this embedder reads ids from, when it uses
    /// one.
    #[must_use]
    pub fn vocab_namespace(&self) -> Option<&str> {
        match self {
            Self::Embedding {
                vocab_namespace, ..
            } => Some(vocab_namespace),
            Self::CharacterEncoding { .. }
            | Self::BertPretrained { .. }
            | Self::ElmoTokenEmbedder { .. } => None,
        }
    }

    /// Pretrained artefacts this embedder will acquire at first use.
    #[must_use]
    pub fn pretrained_resources(&self) -> Vec<&PretrainedResource> {
        match self {
            Self::Embedding {
                pretrained_file, ..
            } => pretrained_file.iter().collect(),
            Self::CharacterEncoding { .. } => Vec::new(),
            Self::BertPretrained { model, .. } => vec![model],
            Self::ElmoTokenEmbedder {
                options_file,
                weight_file,
                ..
            } => vec![options_file, weight_file],
        }
    }

    /// Re-emit the spec this embedder was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        match self {
            Self::Embedding {
                embedding_dim,
                vocab_namespace,
                pretrained_file,
                trainable,
            } => {
                let mut spec = ComponentSpec::new("embedding")
                    .with("embedding_dim", *embedding_dim)
                    .with("vocab_namespace", vocab_namespace.clone())
                    .with("trainable", *trainable);
                if let Some(resource) = pretrained_file {
                    spec = spec.with("pretrained_file", resource.location.as_str());
                    if let Some(digest) = &resource.sha256 {
                        spec = spec.with("sha256", json!(digest));
                    }
                }
                spec
            }
            Self::CharacterEncoding {
                embedding_dim,
                encoder,
            } => ComponentSpec::new("character_encoding")
                .with("embedding_dim", *embedding_dim)
                .with("encoder", serde_json::to_value(encoder.to_spec()).unwrap_or_default()),
            Self::BertPretrained {
                model,
                hidden_dim,
                requires_grad,
            } => {
                let mut spec = ComponentSpec::new("bert-pretrained")
                    .with("pretrained_model", model.location.as_str())
                    .with("hidden_dim", *hidden_dim)
                    .with("requires_grad", *requires_grad);
                if let Some(digest) = &model.sha256 {
                    spec = spec.with("sha256", json!(digest));
                }
                spec
            }
            Self::ElmoTokenEmbedder {
                options_file,
                weight_file,
                projection_dim,
                dropout,
                requires_grad,
            } => {
                let mut spec = ComponentSpec::new("elmo_token_embedder")
                    .with("options_file", options_file.location.as_str())
                    .with("weight_file", weight_file.location.as_str())
                    .with("dropout", json!(dropout))
                    .with("requires_grad", *requires_grad);
                if let Some(dim) = projection_dim {
                    spec = spec.with("projection_dim", *dim);
                }
                spec
            }
        }
    }
}

/// Collection of per-channel embedders with the matching policy the document
/// declared.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEmbedder {
    pub allow_unmatched_keys: bool,
    pub embedders: BTreeMap<String, TokenEmbedder>,
}

impl SourceEmbedder {
    /// Concatenated width of every channel's output.
    #[must_use]
    pub fn total_output_dim(&self) -> usize {
        self.embedders.values().map(TokenEmbedder::output_dim).sum()
    }
}
