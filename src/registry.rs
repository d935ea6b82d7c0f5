//! Category/tag registries mapping component specs to constructors.
//!
//! The source corpus dispatched every block through a `"type"` string
//! registered against a class. Here each category owns an explicit table
//! from tag to constructor function; resolution is pure and constructs
//! descriptors only, never fetching anything.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::components::{
    Attention, DatasetReader, LrScheduler, Metric, Optimizer, ReaderKind, Seq2SeqEncoder,
    TokenEmbedder, TokenIndexer,
};
use crate::error::ConfigError;
use crate::params::{ComponentSpec, Params};

/// Component category a spec is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    DatasetReader,
    TokenIndexer,
    TokenEmbedder,
    Seq2SeqEncoder,
    Attention,
    Optimizer,
    LrScheduler,
    Metric,
}

impl Category {
    /// The category name as it appears in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DatasetReader => "dataset_reader",
            Self::TokenIndexer => "token_indexer",
            Self::TokenEmbedder => "token_embedder",
            Self::Seq2SeqEncoder => "seq2seq_encoder",
            Self::Attention => "attention",
            Self::Optimizer => "optimizer",
            Self::LrScheduler => "lr_scheduler",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spec named a tag with no registered constructor in its category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {category} type \"{tag}\" is registered")]
pub struct UnknownTypeError {
    pub category: Category,
    pub tag: String,
}

/// Constructor for one tag within a category. Receives the full registry so
/// nested specs (a reader's indexers, a character encoder) resolve through
/// the same tables.
pub type Factory<T> = fn(&ComponentRegistry, &Params<'_>) -> Result<T, ConfigError>;

/// Tag table for one component category.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    category: Category,
    constructors: BTreeMap<&'static str, Factory<T>>,
}

impl<T> Registry<T> {
    /// An empty registry for `category`.
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            category,
            constructors: BTreeMap::new(),
        }
    }

    /// Register `factory` under `tag`, replacing any previous entry.
    pub fn register(&mut self, tag: &'static str, factory: Factory<T>) {
        self.constructors.insert(tag, factory);
    }

    /// Resolve `spec` at document path `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTypeError`] when the spec's tag has no constructor
    /// in this category, and otherwise whatever the constructor reports.
    pub fn resolve(
        &self,
        registry: &ComponentRegistry,
        spec: &ComponentSpec,
        path: &str,
    ) -> Result<T, ConfigError> {
        let Some(factory) = self.constructors.get(spec.tag.as_str()) else {
            return Err(UnknownTypeError {
                category: self.category,
                tag: spec.tag.clone(),
            }
            .into());
        };
        debug!(category = %self.category, tag = %spec.tag, path, "resolving component");
        factory(registry, &spec.params_at(path))
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }
}

/// One registry per category, pre-populated with the built-in components.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    pub dataset_readers: Registry<DatasetReader>,
    pub token_indexers: Registry<TokenIndexer>,
    pub token_embedders: Registry<TokenEmbedder>,
    pub seq2seq_encoders: Registry<Seq2SeqEncoder>,
    pub attentions: Registry<Attention>,
    pub optimizers: Registry<Optimizer>,
    pub lr_schedulers: Registry<LrScheduler>,
    pub metrics: Registry<Metric>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut dataset_readers = Registry::new(Category::DatasetReader);
        dataset_readers.register("copynet", |registry, params| {
            DatasetReader::from_params(ReaderKind::Copynet, registry, params)
        });
        dataset_readers.register("copynet_const", |registry, params| {
            DatasetReader::from_params(ReaderKind::CopynetConst, registry, params)
        });

        let mut token_indexers = Registry::new(Category::TokenIndexer);
        token_indexers.register("single_id", |_, params| TokenIndexer::single_id(params));
        token_indexers.register("characters", |_, params| TokenIndexer::characters(params));
        token_indexers.register("bert-pretrained", |_, params| {
            TokenIndexer::bert_pretrained(params)
        });
        token_indexers.register("elmo_characters", |_, params| {
            TokenIndexer::elmo_characters(params)
        });

        let mut token_embedders = Registry::new(Category::TokenEmbedder);
        token_embedders.register("embedding", |_, params| TokenEmbedder::embedding(params));
        token_embedders.register("character_encoding", TokenEmbedder::character_encoding);
        token_embedders.register("bert-pretrained", |_, params| {
            TokenEmbedder::bert_pretrained(params)
        });
        token_embedders.register("elmo_token_embedder", |_, params| TokenEmbedder::elmo(params));

        let mut seq2seq_encoders = Registry::new(Category::Seq2SeqEncoder);
        seq2seq_encoders.register("lstm", |_, params| Seq2SeqEncoder::lstm(params));

        let mut attentions = Registry::new(Category::Attention);
        attentions.register("bilinear", |_, params| Attention::bilinear(params));

        let mut optimizers = Registry::new(Category::Optimizer);
        optimizers.register("sgd", |_, params| Optimizer::sgd(params));
        optimizers.register("adam", |_, params| Optimizer::adam(params));

        let mut lr_schedulers = Registry::new(Category::LrScheduler);
        lr_schedulers.register("cosine", |_, params| LrScheduler::cosine(params));

        let mut metrics = Registry::new(Category::Metric);
        metrics.register("bleu", |_, params| Metric::bleu(params));
        metrics.register("token_sequence_accuracy", |_, params| {
            Metric::token_sequence_accuracy(params)
        });

        Self {
            dataset_readers,
            token_indexers,
            token_embedders,
            seq2seq_encoders,
            attentions,
            optimizers,
            lr_schedulers,
            metrics,
        }
    }
}

impl ComponentRegistry {
    /// Resolve a dataset reader spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn reader(&self, spec: &ComponentSpec, path: &str) -> Result<DatasetReader, ConfigError> {
        self.dataset_readers.resolve(self, spec, path)
    }

    /// Resolve a token indexer spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn indexer(&self, spec: &ComponentSpec, path: &str) -> Result<TokenIndexer, ConfigError> {
        self.token_indexers.resolve(self, spec, path)
    }

    /// Resolve a token embedder spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn embedder(&self, spec: &ComponentSpec, path: &str) -> Result<TokenEmbedder, ConfigError> {
        self.token_embedders.resolve(self, spec, path)
    }

    /// Resolve an encoder spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn encoder(&self, spec: &ComponentSpec, path: &str) -> Result<Seq2SeqEncoder, ConfigError> {
        self.seq2seq_encoders.resolve(self, spec, path)
    }

    /// Resolve an attention spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn attention(&self, spec: &ComponentSpec, path: &str) -> Result<Attention, ConfigError> {
        self.attentions.resolve(self, spec, path)
    }

    /// Resolve an optimizer spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn optimizer(&self, spec: &ComponentSpec, path: &str) -> Result<Optimizer, ConfigError> {
        self.optimizers.resolve(self, spec, path)
    }

    /// Resolve a learning-rate scheduler spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn scheduler(&self, spec: &ComponentSpec, path: &str) -> Result<LrScheduler, ConfigError> {
        self.lr_schedulers.resolve(self, spec, path)
    }

    /// Resolve a metric spec.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn metric(&self, spec: &ComponentSpec, path: &str) -> Result<Metric, ConfigError> {
        self.metrics.resolve(self, spec, path)
    }
}
