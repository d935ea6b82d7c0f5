//! Resolved component descriptors.
//!
//! Everything the registry can construct from a tagged spec: readers,
//! indexers, embedders, the encoder, attention, optimizers, schedulers, and
//! metrics. Descriptors are plain data with width accessors; the neural
//! network implementations they select are external collaborators.

mod attention;
mod embedders;
mod encoder;
mod indexers;
mod metrics;
mod reader;
mod resource;
mod trainer;

pub use attention::Attention;
pub use embedders::{SourceEmbedder, TokenEmbedder};
pub use encoder::Seq2SeqEncoder;
pub use indexers::TokenIndexer;
pub use metrics::Metric;
pub use reader::{DatasetReader, ReaderKind};
pub use resource::{PretrainedResource, ResourceLocation};
pub use trainer::{LrScheduler, Optimizer};
