//! Experiment descriptor builder.
//!
//! The pipeline is expressed in types rather than flags: an unparsed
//! document becomes an [`ExperimentConfig`] (Parsed), then a
//! [`ValidatedExperiment`] (Validated), then a [`ResolvedExperiment`]
//! (Resolved). Each step is one-way; a failed step yields the aggregate
//! error and nothing downstream runs. The resolved descriptor is frozen and
//! may be shared freely across whatever workers the external trainer spawns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::components::{
    Attention, DatasetReader, LrScheduler, Metric, Optimizer, ResourceLocation, Seq2SeqEncoder,
    SourceEmbedder,
};
use crate::error::ConfigError;
use crate::registry::ComponentRegistry;
use crate::schema::{ExperimentConfig, IteratorConfig, ModelFamily, TrainerConfig, VocabularyConfig};
use crate::validate::{check_consistency, ConsistencyError};

/// A declared local path that does not exist at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: no such path: {path}")]
pub struct PathNotFoundError {
    pub field: String,
    pub path: PathBuf,
}

/// Components constructed from the document's specs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedComponents {
    pub reader: DatasetReader,
    pub source_embedder: SourceEmbedder,
    pub encoder: Seq2SeqEncoder,
    pub attention: Attention,
    pub optimizer: Optimizer,
    pub scheduler: Option<LrScheduler>,
    pub metrics: Vec<Metric>,
}

/// Resolve every component spec, collecting all failures instead of
/// stopping at the first.
pub(crate) fn resolve_components(
    config: &ExperimentConfig,
    registry: &ComponentRegistry,
) -> Result<ResolvedComponents, Vec<ConfigError>> {
    let mut errors = Vec::new();

    let reader = registry
        .reader(&config.dataset_reader, "dataset_reader")
        .map_err(|error| errors.push(error))
        .ok();

    let mut embedders = BTreeMap::new();
    for (name, spec) in &config.model.source_embedder.token_embedders {
        let path = format!("model.source_embedder.token_embedders.{name}");
        match registry.embedder(spec, &path) {
            Ok(embedder) => {
                embedders.insert(name.clone(), embedder);
            }
            Err(error) => errors.push(error),
        }
    }

    let encoder = registry
        .encoder(&config.model.encoder, "model.encoder")
        .map_err(|error| errors.push(error))
        .ok();
    let attention = registry
        .attention(&config.model.attention, "model.attention")
        .map_err(|error| errors.push(error))
        .ok();
    let optimizer = registry
        .optimizer(&config.trainer.optimizer, "trainer.optimizer")
        .map_err(|error| errors.push(error))
        .ok();
    let scheduler = match &config.trainer.learning_rate_scheduler {
        None => None,
        Some(spec) => registry
            .scheduler(spec, "trainer.learning_rate_scheduler")
            .map_err(|error| errors.push(error))
            .ok(),
    };

    let mut metrics = Vec::new();
    for (index, spec) in config.model.metrics.iter().enumerate() {
        match registry.metric(spec, &format!("model.metrics.{index}")) {
            Ok(metric) => metrics.push(metric),
            Err(error) => errors.push(error),
        }
    }

    match (reader, encoder, attention, optimizer) {
        (Some(reader), Some(encoder), Some(attention), Some(optimizer))
            if errors.is_empty() =>
        {
            Ok(ResolvedComponents {
                reader,
                source_embedder: SourceEmbedder {
                    allow_unmatched_keys: config.model.source_embedder.allow_unmatched_keys,
                    embedders,
                },
                encoder,
                attention,
                optimizer,
                scheduler,
                metrics,
            })
        }
        _ => Err(errors),
    }
}

impl ExperimentConfig {
    /// Advance Parsed → Validated: resolve every component spec and check
    /// cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns the aggregate of every structural, unknown-type, and
    /// consistency problem found, so one failed run reports them all.
    pub fn validate(
        self,
        registry: &ComponentRegistry,
    ) -> Result<ValidatedExperiment, ConfigError> {
        let mut schema_errors = Vec::new();
        self.validate_structure(&mut schema_errors);
        let mut errors: Vec<ConfigError> =
            schema_errors.into_iter().map(ConfigError::from).collect();

        match resolve_components(&self, registry) {
            Err(resolution_errors) => {
                errors.extend(resolution_errors);
                Err(ConfigError::aggregate(errors))
            }
            Ok(components) => {
                let violations = check_consistency(&self, &components);
                if !violations.is_empty() {
                    errors.push(ConsistencyError { violations }.into());
                }
                if errors.is_empty() {
                    Ok(ValidatedExperiment {
                        config: self,
                        components,
                    })
                } else {
                    Err(ConfigError::aggregate(errors))
                }
            }
        }
    }
}

/// A document whose components resolved and whose cross-field constraints
/// hold: the Validated stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExperiment {
    config: ExperimentConfig,
    components: ResolvedComponents,
}

impl ValidatedExperiment {
    /// The underlying parsed configuration.
    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Advance Validated → Resolved: check declared data paths exist and
    /// freeze the descriptor.
    ///
    /// Local paths are canonicalised to absolute paths; remote URLs defer
    /// existence to first access, as do the pretrained artefacts referenced
    /// by individual components.
    ///
    /// # Errors
    ///
    /// Returns [`PathNotFoundError`] (aggregated when several paths are
    /// missing) for any local path that does not exist.
    pub fn resolve(self) -> Result<ResolvedExperiment, ConfigError> {
        let mut errors: Vec<ConfigError> = Vec::new();

        let train_data_path =
            resolve_data_path("train_data_path", &self.config.train_data_path, &mut errors);
        let validation_data_path = self
            .config
            .validation_data_path
            .as_deref()
            .and_then(|raw| resolve_data_path("validation_data_path", raw, &mut errors));

        let vocabulary = match &self.config.vocabulary {
            Some(VocabularyConfig {
                directory_path: Some(directory),
                ..
            }) => resolve_local_path("vocabulary.directory_path", Path::new(directory))
                .map_err(|error| errors.push(error.into()))
                .map(|path| Vocabulary::FromDirectory { path })
                .ok(),
            Some(config) => Some(Vocabulary::FromInstances {
                min_count: config.min_count.clone(),
                tokens_to_add: config.tokens_to_add.clone(),
            }),
            None => Some(Vocabulary::FromInstances {
                min_count: BTreeMap::new(),
                tokens_to_add: BTreeMap::new(),
            }),
        };

        let (Some(train_data_path), Some(vocabulary)) = (train_data_path, vocabulary) else {
            return Err(ConfigError::aggregate(errors));
        };
        if !errors.is_empty() {
            return Err(ConfigError::aggregate(errors));
        }

        let ResolvedComponents {
            reader,
            source_embedder,
            encoder,
            attention,
            optimizer,
            scheduler,
            metrics,
        } = self.components;
        let model_config = self.config.model;
        let trainer_config = self.config.trainer;

        info!(
            train = %train_data_path,
            beam_size = model_config.beam_size,
            "experiment resolved"
        );
        Ok(ResolvedExperiment {
            dataset_reader: reader,
            vocabulary,
            model: ResolvedModel {
                family: model_config.family,
                source_embedder,
                encoder,
                attention,
                target_embedding_dim: model_config.target_embedding_dim,
                beam_size: model_config.beam_size,
                max_decoding_steps: model_config.max_decoding_steps,
                copy_token: model_config.copy_token,
                source_namespace: model_config.source_namespace,
                target_namespace: model_config.target_namespace,
                metrics,
            },
            iterator: self.config.iterator,
            trainer: TrainerPolicy {
                optimizer,
                scheduler,
                num_epochs: trainer_config.num_epochs,
                patience: trainer_config.patience,
                device: Device::from_ordinal(trainer_config.cuda_device),
                grad_norm: trainer_config.grad_norm,
                validation_metric: trainer_config.validation_metric,
                shuffle: trainer_config.shuffle,
                should_log_learning_rate: trainer_config.should_log_learning_rate,
                should_log_parameter_statistics: trainer_config.should_log_parameter_statistics,
            },
            train_data_path,
            validation_data_path,
            datasets_for_vocab_creation: self.config.datasets_for_vocab_creation,
        })
    }
}

fn resolve_data_path(
    field: &str,
    raw: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<ResourceLocation> {
    match ResourceLocation::parse(raw) {
        remote @ ResourceLocation::Remote(_) => Some(remote),
        ResourceLocation::Local(path) => resolve_local_path(field, &path)
            .map_err(|error| errors.push(error.into()))
            .map(ResourceLocation::Local)
            .ok(),
    }
}

fn resolve_local_path(field: &str, path: &Path) -> Result<PathBuf, PathNotFoundError> {
    std::fs::canonicalize(path).map_err(|_| PathNotFoundError {
        field: field.to_owned(),
        path: path.to_path_buf(),
    })
}

/// Training device selected by the trainer section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Gpu(u32),
}

impl Device {
    fn from_ordinal(ordinal: i64) -> Self {
        u32::try_from(ordinal).map_or(Self::Cpu, Self::Gpu)
    }

    fn to_ordinal(self) -> i64 {
        match self {
            Self::Cpu => -1,
            Self::Gpu(ordinal) => i64::from(ordinal),
        }
    }
}

/// Effective vocabulary policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vocabulary {
    /// Load a previously serialised vocabulary from this directory.
    FromDirectory { path: PathBuf },
    /// Build the vocabulary from the training instances.
    FromInstances {
        min_count: BTreeMap<String, usize>,
        tokens_to_add: BTreeMap<String, Vec<String>>,
    },
}

/// Resolved model graph description.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModel {
    pub family: ModelFamily,
    pub source_embedder: SourceEmbedder,
    pub encoder: Seq2SeqEncoder,
    pub attention: Attention,
    pub target_embedding_dim: usize,
    pub beam_size: usize,
    pub max_decoding_steps: usize,
    pub copy_token: String,
    pub source_namespace: String,
    pub target_namespace: String,
    pub metrics: Vec<Metric>,
}

/// Resolved trainer policy.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerPolicy {
    pub optimizer: Optimizer,
    pub scheduler: Option<LrScheduler>,
    pub num_epochs: usize,
    pub patience: Option<usize>,
    pub device: Device,
    pub grad_norm: Option<f64>,
    pub validation_metric: String,
    pub shuffle: bool,
    pub should_log_learning_rate: bool,
    pub should_log_parameter_statistics: bool,
}

/// The Resolved stage: the sole handoff artifact to the external training
/// loop. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExperiment {
    dataset_reader: DatasetReader,
    vocabulary: Vocabulary,
    model: ResolvedModel,
    iterator: IteratorConfig,
    trainer: TrainerPolicy,
    train_data_path: ResourceLocation,
    validation_data_path: Option<ResourceLocation>,
    datasets_for_vocab_creation: Option<Vec<String>>,
}

impl ResolvedExperiment {
    /// The resolved dataset reader.
    #[must_use]
    pub fn dataset_reader(&self) -> &DatasetReader {
        &self.dataset_reader
    }

    /// The effective vocabulary policy.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The resolved model graph description.
    #[must_use]
    pub fn model(&self) -> &ResolvedModel {
        &self.model
    }

    /// The batching policy.
    #[must_use]
    pub fn iterator(&self) -> &IteratorConfig {
        &self.iterator
    }

    /// The trainer policy.
    #[must_use]
    pub fn trainer(&self) -> &TrainerPolicy {
        &self.trainer
    }

    /// Resolved training data location.
    #[must_use]
    pub fn train_data_path(&self) -> &ResourceLocation {
        &self.train_data_path
    }

    /// Resolved validation data location, when declared.
    #[must_use]
    pub fn validation_data_path(&self) -> Option<&ResourceLocation> {
        self.validation_data_path.as_ref()
    }

    /// Datasets contributing to vocabulary creation, when restricted.
    #[must_use]
    pub fn datasets_for_vocab_creation(&self) -> Option<&[String]> {
        self.datasets_for_vocab_creation.as_deref()
    }

    /// Re-emit the structural configuration this descriptor was resolved
    /// from. Resolving the result yields an equivalent descriptor.
    #[must_use]
    pub fn to_config(&self) -> ExperimentConfig {
        let vocabulary = match &self.vocabulary {
            Vocabulary::FromDirectory { path } => Some(VocabularyConfig {
                directory_path: Some(path.display().to_string()),
                min_count: BTreeMap::new(),
                tokens_to_add: BTreeMap::new(),
            }),
            Vocabulary::FromInstances {
                min_count,
                tokens_to_add,
            } => {
                if min_count.is_empty() && tokens_to_add.is_empty() {
                    None
                } else {
                    Some(VocabularyConfig {
                        directory_path: None,
                        min_count: min_count.clone(),
                        tokens_to_add: tokens_to_add.clone(),
                    })
                }
            }
        };
        ExperimentConfig {
            dataset_reader: self.dataset_reader.to_spec(),
            train_data_path: self.train_data_path.as_str().to_owned(),
            validation_data_path: self
                .validation_data_path
                .as_ref()
                .map(|location| location.as_str().to_owned()),
            datasets_for_vocab_creation: self.datasets_for_vocab_creation.clone(),
            vocabulary,
            model: crate::schema::ModelConfig {
                family: self.model.family,
                source_embedder: crate::schema::EmbedderConfig {
                    allow_unmatched_keys: self.model.source_embedder.allow_unmatched_keys,
                    token_embedders: self
                        .model
                        .source_embedder
                        .embedders
                        .iter()
                        .map(|(name, embedder)| (name.clone(), embedder.to_spec()))
                        .collect(),
                },
                encoder: self.model.encoder.to_spec(),
                attention: self.model.attention.to_spec(),
                target_embedding_dim: self.model.target_embedding_dim,
                beam_size: self.model.beam_size,
                max_decoding_steps: self.model.max_decoding_steps,
                copy_token: self.model.copy_token.clone(),
                source_namespace: self.model.source_namespace.clone(),
                target_namespace: self.model.target_namespace.clone(),
                metrics: self.model.metrics.iter().map(Metric::to_spec).collect(),
            },
            iterator: self.iterator.clone(),
            trainer: TrainerConfig {
                optimizer: self.trainer.optimizer.to_spec(),
                learning_rate_scheduler: self
                    .trainer
                    .scheduler
                    .as_ref()
                    .map(LrScheduler::to_spec),
                num_epochs: self.trainer.num_epochs,
                patience: self.trainer.patience,
                cuda_device: self.trainer.device.to_ordinal(),
                grad_norm: self.trainer.grad_norm,
                validation_metric: self.trainer.validation_metric.clone(),
                shuffle: self.trainer.shuffle,
                should_log_learning_rate: self.trainer.should_log_learning_rate,
                should_log_parameter_statistics: self.trainer.should_log_parameter_statistics,
            },
        }
    }

    /// Every pretrained artefact the resolved components will acquire at
    /// first use.
    #[must_use]
    pub fn pretrained_resources(&self) -> Vec<&crate::components::PretrainedResource> {
        let mut resources = Vec::new();
        for embedder in self.model.source_embedder.embedders.values() {
            resources.extend(embedder.pretrained_resources());
        }
        for indexer in self.dataset_reader.source_token_indexers.values() {
            if let crate::components::TokenIndexer::BertPretrained { vocab, .. } = indexer {
                resources.push(vocab);
            }
        }
        resources
    }
}

/// Run the whole pipeline: parse, validate, and resolve a document.
///
/// # Errors
///
/// Returns the first stage's aggregate error: a [`crate::SchemaError`] from
/// parsing, or a [`ConfigError`] aggregate from validation or path
/// resolution.
pub fn resolve_experiment(
    document: &str,
    registry: &ComponentRegistry,
) -> Result<ResolvedExperiment, ConfigError> {
    let parsed = ExperimentConfig::from_json_str(document)?;
    parsed.validate(registry)?.resolve()
}
