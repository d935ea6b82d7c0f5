//! Dataset reader descriptors.
//!
//! A reader declares how raw parallel data becomes instances: which token
//! indexers populate each source channel and which fields every instance
//! carries. The field list is what iterator sorting keys are checked against.

use std::collections::BTreeMap;

use super::indexers::TokenIndexer;
use crate::error::ConfigError;
use crate::params::{spec_from_value, ComponentSpec, Params};
use crate::registry::ComponentRegistry;

/// Instance fields shared by every reader.
const BASE_FIELDS: &[&str] = &["source_tokens", "target_tokens"];

/// Reader family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    /// Tab-separated source/target pairs.
    Copynet,
    /// Source/target pairs with a constant-annotation channel.
    CopynetConst,
}

impl ReaderKind {
    /// The registry tag for this family.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Copynet => "copynet",
            Self::CopynetConst => "copynet_const",
        }
    }
}

/// Resolved dataset reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReader {
    pub kind: ReaderKind,
    pub target_namespace: String,
    pub source_token_indexers: BTreeMap<String, TokenIndexer>,
}

impl DatasetReader {
    /// Construct a reader of the given family from a parameter block.
    ///
    /// Absent `source_token_indexers` default to a single `single_id`
    /// channel named `tokens`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] for missing or mistyped fields and
    /// an [`crate::UnknownTypeError`] for an unregistered indexer tag.
    pub fn from_params(
        kind: ReaderKind,
        registry: &ComponentRegistry,
        params: &Params<'_>,
    ) -> Result<Self, ConfigError> {
        let target_namespace = params.str_or("target_namespace", "target_tokens")?.to_owned();
        let source_token_indexers = match params.opt_object("source_token_indexers")? {
            None => {
                let spec = ComponentSpec::new("single_id");
                let indexer =
                    registry.indexer(&spec, "dataset_reader.source_token_indexers.tokens")?;
                [("tokens".to_owned(), indexer)].into_iter().collect()
            }
            Some((map, path)) => {
                let mut indexers = BTreeMap::new();
                for (name, value) in map {
                    let (spec, spec_path) = spec_from_value(value, format!("{path}.{name}"))?;
                    indexers.insert(name.clone(), registry.indexer(&spec, &spec_path)?);
                }
                indexers
            }
        };
        Ok(Self {
            kind,
            target_namespace,
            source_token_indexers,
        })
    }

    /// Fields each instance produced by this reader carries.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = BASE_FIELDS.to_vec();
        if self.kind == ReaderKind::CopynetConst {
            fields.push("source_indices");
        }
        fields
    }

    /// Re-emit the spec this reader was built from.
    #[must_use]
    pub fn to_spec(&self) -> ComponentSpec {
        let indexers: serde_json::Map<String, serde_json::Value> = self
            .source_token_indexers
            .iter()
            .map(|(name, indexer)| {
                (
                    name.clone(),
                    serde_json::to_value(indexer.to_spec()).unwrap_or_default(),
                )
            })
            .collect();
        ComponentSpec::new(self.kind.tag())
            .with("target_namespace", self.target_namespace.clone())
            .with("source_token_indexers", indexers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolve(spec: &ComponentSpec) -> Result<DatasetReader, ConfigError> {
        let registry = ComponentRegistry::default();
        registry.reader(spec, "dataset_reader")
    }

    #[rstest]
    fn defaults_to_a_single_id_channel() {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let reader = resolve(&ComponentSpec::new("copynet")).expect("resolve reader");
        assert_eq!(reader.kind, ReaderKind::Copynet);
        assert_eq!(reader.target_namespace, "target_tokens");
        assert_eq!(
            reader.source_token_indexers.keys().collect::<Vec<_>>(),
            vec!["tokens"]
        );
    }

    #[rstest]
    #[case(ReaderKind::Copynet, vec!["source_tokens", "target_tokens"])]
    #[case(
        ReaderKind::CopynetConst,
        vec!["source_tokens", "target_tokens", "source_indices"]
    )]
    fn field_lists_follow_the_family(#[case] kind: ReaderKind, #[case] expected: Vec<&str>) {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let reader = resolve(&ComponentSpec::new(kind.tag())).expect("resolve reader");
        assert_eq!(reader.fields(), expected);
    }

    #[rstest]
    fn nested_indexers_resolve_by_tag() {
        let spec = ComponentSpec::new("copynet").with(
            "source_token_indexers",
            serde_json::json!({
                "tokens": { "type": "single_id" },
                "bert": { "type": "bert-pretrained", "pretrained_model": "vocab/bert.txt" }
            }),
        );
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let reader = resolve(&spec).expect("resolve reader");
        assert_eq!(reader.source_token_indexers.len(), 2);
        assert_eq!(reader.source_token_indexers["bert"].namespace(), "bert");
    }

    #[rstest]
    fn unknown_nested_indexer_tag_is_reported() {
        let spec = ComponentSpec::new("copynet").with(
            "source_token_indexers",
            serde_json::json!({ "tokens": { "type": "byte_pair" } }),
        );
        let err = resolve(&spec).unwrap_err();
        assert!(err.to_string().contains("byte_pair"));
    }
}
