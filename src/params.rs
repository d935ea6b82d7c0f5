//! Tagged component specs and typed parameter extraction.
//!
//! Every nested block in an experiment document shares one shape: a `type`
//! tag selecting an implementation plus a free-form parameter map. [`Params`]
//! is a path-carrying view over such a map; its getters fail with a
//! [`SchemaError`] naming the full dotted field path so a misconfigured
//! document points straight at the offending key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural errors in a configuration document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A required field is absent.
    #[error("{path}: required field is missing")]
    MissingField { path: String },
    /// A field holds a value of the wrong kind.
    #[error("{path}: expected {expected} but found {found}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: String,
    },
    /// A field is present and well-typed but its value is not acceptable.
    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
    /// The document is not parseable JSON at all.
    #[error("document is not valid JSON: {0}")]
    Malformed(String),
}

impl SchemaError {
    /// Shorthand for [`SchemaError::Invalid`].
    #[must_use]
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The universal shape of a nested configuration block: a `type` tag plus
/// parameters.
///
/// # Examples
///
/// ```
/// use copynet_config::ComponentSpec;
///
/// let spec: ComponentSpec =
///     serde_json::from_str(r#"{"type": "lstm", "hidden_size": 100}"#)
///         .expect("deserialise spec");
/// assert_eq!(spec.tag, "lstm");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Tag selecting an implementation within a registry category.
    #[serde(rename = "type")]
    pub tag: String,
    /// Remaining keys of the block, interpreted by the selected constructor.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ComponentSpec {
    /// Create a spec with the given tag and no parameters.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// View the parameters rooted at `path` (e.g. `model.encoder`).
    #[must_use]
    pub fn params_at(&self, path: impl Into<String>) -> Params<'_> {
        Params {
            path: path.into(),
            map: &self.params,
        }
    }
}

/// Path-carrying view over a spec's parameter map.
#[derive(Debug, Clone)]
pub struct Params<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    /// Wrap a raw map rooted at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, map: &'a Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            map,
        }
    }

    /// The dotted path of this block within the document.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The dotted path of `key` within the document.
    #[must_use]
    pub fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn get(&self, key: &str) -> Result<&'a Value, SchemaError> {
        self.map.get(key).ok_or_else(|| SchemaError::MissingField {
            path: self.field_path(key),
        })
    }

    /// Required non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] when absent and
    /// [`SchemaError::WrongKind`] when the value is not a non-negative
    /// integer.
    pub fn usize(&self, key: &str) -> Result<usize, SchemaError> {
        let value = self.get(key)?;
        as_usize(value).ok_or_else(|| SchemaError::WrongKind {
            path: self.field_path(key),
            expected: "non-negative integer",
            found: kind_of(value),
        })
    }

    /// Non-negative integer with a default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not a
    /// non-negative integer.
    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, SchemaError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => as_usize(value).ok_or_else(|| SchemaError::WrongKind {
                path: self.field_path(key),
                expected: "non-negative integer",
                found: kind_of(value),
            }),
        }
    }

    /// Optional non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not a
    /// non-negative integer.
    pub fn opt_usize(&self, key: &str) -> Result<Option<usize>, SchemaError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(value) => as_usize(value)
                .map(Some)
                .ok_or_else(|| SchemaError::WrongKind {
                    path: self.field_path(key),
                    expected: "non-negative integer",
                    found: kind_of(value),
                }),
        }
    }

    /// Required number.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] when absent and
    /// [`SchemaError::WrongKind`] when the value is not numeric.
    pub fn f64(&self, key: &str) -> Result<f64, SchemaError> {
        let value = self.get(key)?;
        value.as_f64().ok_or_else(|| SchemaError::WrongKind {
            path: self.field_path(key),
            expected: "number",
            found: kind_of(value),
        })
    }

    /// Number with a default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not numeric.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, SchemaError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| SchemaError::WrongKind {
                path: self.field_path(key),
                expected: "number",
                found: kind_of(value),
            }),
        }
    }

    /// Boolean with a default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not boolean.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, SchemaError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| SchemaError::WrongKind {
                path: self.field_path(key),
                expected: "boolean",
                found: kind_of(value),
            }),
        }
    }

    /// Required string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] when absent and
    /// [`SchemaError::WrongKind`] when the value is not a string.
    pub fn str(&self, key: &str) -> Result<&'a str, SchemaError> {
        let value = self.get(key)?;
        value.as_str().ok_or_else(|| SchemaError::WrongKind {
            path: self.field_path(key),
            expected: "string",
            found: kind_of(value),
        })
    }

    /// String with a default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not a string.
    pub fn str_or(&self, key: &str, default: &'a str) -> Result<&'a str, SchemaError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value.as_str().ok_or_else(|| SchemaError::WrongKind {
                path: self.field_path(key),
                expected: "string",
                found: kind_of(value),
            }),
        }
    }

    /// Optional string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not a string.
    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, SchemaError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| SchemaError::WrongKind {
                    path: self.field_path(key),
                    expected: "string",
                    found: kind_of(value),
                }),
        }
    }

    /// Optional object field, returned as a raw map plus its dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WrongKind`] when present but not an object.
    pub fn opt_object(
        &self,
        key: &str,
    ) -> Result<Option<(&'a Map<String, Value>, String)>, SchemaError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(value) => {
                let map = value.as_object().ok_or_else(|| SchemaError::WrongKind {
                    path: self.field_path(key),
                    expected: "object",
                    found: kind_of(value),
                })?;
                Ok(Some((map, self.field_path(key))))
            }
        }
    }

    /// Required nested component spec.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] when absent,
    /// [`SchemaError::WrongKind`] when the value is not an object, and
    /// [`SchemaError::MissingField`] for the nested `type` tag.
    pub fn spec(&self, key: &str) -> Result<(ComponentSpec, String), SchemaError> {
        let value = self.get(key)?;
        let path = self.field_path(key);
        spec_from_value(value, path)
    }
}

/// Interpret a JSON value as a tagged component spec rooted at `path`.
///
/// # Errors
///
/// Returns [`SchemaError::WrongKind`] when the value is not an object and
/// [`SchemaError::MissingField`] when the object lacks a string `type` tag.
pub fn spec_from_value(value: &Value, path: String) -> Result<(ComponentSpec, String), SchemaError> {
    let object = value.as_object().ok_or_else(|| SchemaError::WrongKind {
        path: path.clone(),
        expected: "object",
        found: kind_of(value),
    })?;
    let tag = match object.get("type") {
        None => {
            return Err(SchemaError::MissingField {
                path: format!("{path}.type"),
            })
        }
        Some(tag) => tag
            .as_str()
            .ok_or_else(|| SchemaError::WrongKind {
                path: format!("{path}.type"),
                expected: "string",
                found: kind_of(tag),
            })?
            .to_owned(),
    };
    let mut params = object.clone();
    params.remove("type");
    Ok((ComponentSpec { tag, params }, path))
}

fn as_usize(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "boolean".to_owned(),
        Value::Number(n) if n.as_u64().is_some() => "non-negative integer".to_owned(),
        Value::Number(n) if n.as_i64().is_some() => "negative integer".to_owned(),
        Value::Number(_) => "number".to_owned(),
        Value::String(_) => "string".to_owned(),
        Value::Array(_) => "array".to_owned(),
        Value::Object(_) => "object".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lstm_spec() -> ComponentSpec {
        ComponentSpec::new("lstm")
            .with("input_size", 100)
            .with("hidden_size", 100)
            .with("bidirectional", true)
    }

    #[rstest]
    fn typed_getters_read_values() {
        let spec = lstm_spec();
        let params = spec.params_at("model.encoder");
        assert_eq!(params.usize("input_size"), Ok(100));
        assert_eq!(params.bool_or("bidirectional", false), Ok(true));
        assert_eq!(params.usize_or("num_layers", 1), Ok(1));
    }

    #[rstest]
    fn missing_field_names_dotted_path() {
        let spec = lstm_spec();
        let params = spec.params_at("model.encoder");
        assert_eq!(
            params.usize("num_layers_wrong"),
            Err(SchemaError::MissingField {
                path: "model.encoder.num_layers_wrong".into()
            })
        );
    }

    #[rstest]
    fn wrong_kind_names_expected_and_found() {
        let spec = ComponentSpec::new("lstm").with("input_size", "not a number");
        let params = spec.params_at("model.encoder");
        assert_eq!(
            params.usize("input_size"),
            Err(SchemaError::WrongKind {
                path: "model.encoder.input_size".into(),
                expected: "non-negative integer",
                found: "string".into(),
            })
        );
    }

    #[rstest]
    fn negative_is_rejected_where_positive_required() {
        let spec = ComponentSpec::new("lstm").with("input_size", -4);
        let params = spec.params_at("model.encoder");
        assert_eq!(
            params.usize("input_size"),
            Err(SchemaError::WrongKind {
                path: "model.encoder.input_size".into(),
                expected: "non-negative integer",
                found: "negative integer".into(),
            })
        );
    }

    #[rstest]
    fn nested_spec_requires_type_tag() {
        let spec = ComponentSpec::new("copynet").with(
            "source_tokenizer",
            serde_json::json!({ "word_splitter": "just_spaces" }),
        );
        let params = spec.params_at("dataset_reader");
        assert_eq!(
            params.spec("source_tokenizer").unwrap_err(),
            SchemaError::MissingField {
                path: "dataset_reader.source_tokenizer.type".into()
            }
        );
    }

    #[rstest]
    fn spec_round_trips_through_json() {
        let spec = lstm_spec();
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let json = serde_json::to_string(&spec).expect("serialise spec");
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let back: ComponentSpec = serde_json::from_str(&json).expect("deserialise spec");
        assert_eq!(back, spec);
    }
}
