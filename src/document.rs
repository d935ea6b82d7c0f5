//! Document loading: comment stripping and section-wise parsing.
//!
//! Experiment documents are JSON with `//` line and `/* */` block comments
//! tolerated outside string literals. Comments are blanked before structural
//! parsing so `serde_json` line numbers still line up with the source. Each
//! top-level section deserialises separately so a failure names the section
//! it occurred in.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::params::SchemaError;
use crate::schema::ExperimentConfig;

const TOP_LEVEL_KEYS: &[&str] = &[
    "dataset_reader",
    "train_data_path",
    "validation_data_path",
    "datasets_for_vocab_creation",
    "vocabulary",
    "model",
    "iterator",
    "trainer",
];

/// Parse a configuration document into the Parsed stage.
///
/// # Errors
///
/// Returns [`SchemaError::Malformed`] when the stripped document is not
/// JSON, and a path-carrying [`SchemaError`] for an unknown top-level key or
/// a section that does not match its schema.
pub(crate) fn parse_document(document: &str) -> Result<ExperimentConfig, SchemaError> {
    let stripped = strip_comments(document);
    let value: Value =
        serde_json::from_str(&stripped).map_err(|source| SchemaError::Malformed(source.to_string()))?;
    let Value::Object(root) = value else {
        return Err(SchemaError::Malformed(
            "the top level of a document must be an object".to_owned(),
        ));
    };
    for key in root.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(SchemaError::invalid(key, "unknown top-level key"));
        }
    }
    Ok(ExperimentConfig {
        dataset_reader: required_section(&root, "dataset_reader")?,
        train_data_path: required_section(&root, "train_data_path")?,
        validation_data_path: optional_section(&root, "validation_data_path")?,
        datasets_for_vocab_creation: optional_section(&root, "datasets_for_vocab_creation")?,
        vocabulary: optional_section(&root, "vocabulary")?,
        model: required_section(&root, "model")?,
        iterator: required_section(&root, "iterator")?,
        trainer: required_section(&root, "trainer")?,
    })
}

fn required_section<T: DeserializeOwned>(
    root: &Map<String, Value>,
    key: &str,
) -> Result<T, SchemaError> {
    let value = root.get(key).ok_or_else(|| SchemaError::MissingField {
        path: key.to_owned(),
    })?;
    deserialize_section(value, key)
}

fn optional_section<T: DeserializeOwned>(
    root: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, SchemaError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => deserialize_section(value, key).map(Some),
    }
}

fn deserialize_section<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T, SchemaError> {
    serde_json::from_value(value.clone()).map_err(|source| SchemaError::Invalid {
        path: key.to_owned(),
        message: source.to_string(),
    })
}

/// Blank `//` and `/* */` comments outside string literals.
///
/// Stripped characters become spaces and newlines are preserved, so parser
/// diagnostics keep pointing at the original line and column.
fn strip_comments(input: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Str,
        StrEscape,
        Line,
        Block,
    }

    let mut state = State::Code;
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' => {
                    state = State::Str;
                    output.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::Line;
                    output.push_str("  ");
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::Block;
                    output.push_str("  ");
                }
                _ => output.push(c),
            },
            State::Str => {
                output.push(c);
                match c {
                    '\\' => state = State::StrEscape,
                    '"' => state = State::Code,
                    _ => {}
                }
            }
            State::StrEscape => {
                output.push(c);
                state = State::Str;
            }
            State::Line => {
                if c == '\n' {
                    state = State::Code;
                    output.push('\n');
                } else {
                    output.push(' ');
                }
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                    output.push_str("  ");
                } else if c == '\n' {
                    output.push('\n');
                } else {
                    output.push(' ');
                }
            }
        }
    }
    output
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    /// A complete, consistent document used across the schema tests.
    pub(crate) const MINIMAL_DOCUMENT: &str = r#"{
        // word-level CopyNet baseline
        "dataset_reader": { "type": "copynet", "target_namespace": "target_tokens" },
        "train_data_path": "data/train.tsv",
        "validation_data_path": "data/validation.tsv",
        "model": {
            "type": "copynet",
            "source_embedder": {
                "allow_unmatched_keys": false,
                "token_embedders": {
                    "tokens": { "type": "embedding", "embedding_dim": 100 }
                }
            },
            "encoder": {
                "type": "lstm",
                "input_size": 100,
                "hidden_size": 100,
                "num_layers": 1,
                "bidirectional": true
            },
            "attention": { "type": "bilinear", "vector_dim": 200, "matrix_dim": 200 },
            "beam_size": 5,
            "max_decoding_steps": 50,
            "metrics": [{ "type": "bleu" }]
        },
        /* bucket by source length */
        "iterator": {
            "type": "bucket",
            "batch_size": 32,
            "sorting_keys": [["source_tokens", "num_tokens"]],
            "padding_noise": 0.2
        },
        "trainer": {
            "optimizer": { "type": "adam", "lr": 0.001 },
            "learning_rate_scheduler": {
                "type": "cosine", "t_initial": 5, "t_mul": 1.5, "eta_mul": 0.9
            },
            "num_epochs": 80,
            "patience": 10,
            "cuda_device": -1
        }
    }"#;

    pub(crate) fn minimal_config() -> ExperimentConfig {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        ExperimentConfig::from_json_str(MINIMAL_DOCUMENT).expect("parse minimal document")
    }

    #[rstest]
    fn parses_document_with_comments() {
        let config = minimal_config();
        assert_eq!(config.dataset_reader.tag, "copynet");
        assert_eq!(config.model.beam_size, 5);
        assert_eq!(config.iterator.batch_size, 32);
    }

    #[rstest]
    #[case("// leading\n{\"a\": 1}", "{\"a\": 1}")]
    #[case("{\"a\": 1 /* inline */}", "{\"a\": 1}")]
    #[case("{\"url\": \"http://x/y\"}", "{\"url\": \"http://x/y\"}")]
    #[case("{\"quoted\": \"not // a comment\"}", "{\"quoted\": \"not // a comment\"}")]
    fn comment_stripping_preserves_structure(#[case] input: &str, #[case] equivalent: &str) {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let stripped: Value =
            serde_json::from_str(&strip_comments(input)).expect("parse stripped document");
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let expected: Value = serde_json::from_str(equivalent).expect("parse equivalent");
        assert_eq!(stripped, expected);
    }

    #[rstest]
    fn escaped_quote_does_not_end_string() {
        let input = r#"{"a": "quote \" then // not a comment"}"#;
        assert_eq!(strip_comments(input), input);
    }

    #[rstest]
    fn unknown_top_level_key_is_rejected() {
        let err = ExperimentConfig::from_json_str(r#"{ "modle": {} }"#).unwrap_err();
        assert_eq!(err, SchemaError::invalid("modle", "unknown top-level key"));
    }

    #[rstest]
    fn missing_section_names_the_section() {
        let start = MINIMAL_DOCUMENT
            .find("\"trainer\"")
            .unwrap_or_else(|| panic!("document declares a trainer"));
        let mut document = MINIMAL_DOCUMENT[..start].trim_end().to_owned();
        document.truncate(document.len() - 1); // drop the trailing comma
        document.push('}');
        let err = ExperimentConfig::from_json_str(&document).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField {
                path: "trainer".into()
            }
        );
    }

    #[rstest]
    fn malformed_document_is_reported() {
        let err = ExperimentConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[rstest]
    fn section_error_names_the_section() {
        let document = MINIMAL_DOCUMENT.replace("\"batch_size\": 32", "\"batch_size\": \"many\"");
        let err = ExperimentConfig::from_json_str(&document).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Invalid { ref path, .. } if path == "iterator"
        ));
    }
}
