//! Experiment configuration resolver for CopyNet sequence-to-sequence
//! training.
//!
//! Parses a JSON-with-comments experiment document, resolves every tagged
//! component spec against a registry, verifies cross-field consistency
//! (embedder widths against encoder input, encoder output against attention
//! dimensions, decoding bounds, vocabulary references), and produces an
//! immutable [`ResolvedExperiment`] for an external training loop. The
//! pipeline is `Parsed → Validated → Resolved`; each stage is one-way and a
//! failure yields an aggregate error listing every problem found.
//!
//! The neural network itself (embedding layers, LSTM encoders, attention,
//! beam search, metrics, optimizers) is never implemented here; components
//! are descriptors selected by name.

pub mod components;
mod document;
pub mod error;
pub mod experiment;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod params;
pub mod registry;
pub mod schema;
pub mod validate;

pub use components::{
    Attention, DatasetReader, LrScheduler, Metric, Optimizer, PretrainedResource, ReaderKind,
    ResourceLocation, Seq2SeqEncoder, SourceEmbedder, TokenEmbedder, TokenIndexer,
};
pub use error::ConfigError;
pub use experiment::{
    resolve_experiment, Device, PathNotFoundError, ResolvedExperiment, ResolvedModel,
    TrainerPolicy, ValidatedExperiment, Vocabulary,
};
#[cfg(feature = "fetch")]
pub use fetch::{FetchPolicy, FetchedResource, ResourceUnavailableError};
pub use params::{ComponentSpec, Params, SchemaError};
pub use registry::{Category, ComponentRegistry, Registry, UnknownTypeError};
pub use schema::{
    EmbedderConfig, ExperimentConfig, IteratorConfig, IteratorKind, ModelConfig, ModelFamily,
    TrainerConfig, VocabularyConfig,
};
pub use validate::{ConsistencyError, Violation};
