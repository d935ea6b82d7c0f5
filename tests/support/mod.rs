//! Shared fixtures for the integration tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// On-disk workspace with the data files a document declares.
pub struct Workspace {
    // Held so the files outlive the test body.
    _dir: TempDir,
    pub train: PathBuf,
    pub validation: PathBuf,
}

#[must_use]
pub fn workspace() -> Workspace {
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    let dir = TempDir::new().expect("create workspace");
    let train = dir.path().join("train.tsv");
    let validation = dir.path().join("validation.tsv");
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    std::fs::write(&train, "copy these tokens\tcopy these tokens\n").expect("write train data");
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    std::fs::write(&validation, "hello world\thello world\n").expect("write validation data");
    Workspace {
        _dir: dir,
        train,
        validation,
    }
}

/// A complete, consistent experiment document over the workspace's files.
///
/// Includes line and block comments on purpose; the corpus this schema
/// models carries both inside otherwise strict JSON.
#[must_use]
pub fn document(workspace: &Workspace) -> String {
    format!(
        r#"{{
            // bidirectional word-level CopyNet
            "dataset_reader": {{
                "type": "copynet",
                "target_namespace": "target_tokens"
            }},
            "train_data_path": {train:?},
            "validation_data_path": {validation:?},
            "vocabulary": {{
                "min_count": {{ "source_tokens": 4, "target_tokens": 4 }}
            }},
            "model": {{
                "type": "copynet",
                "source_embedder": {{
                    "allow_unmatched_keys": false,
                    "token_embedders": {{
                        "tokens": {{ "type": "embedding", "embedding_dim": 100 }}
                    }}
                }},
                "encoder": {{
                    "type": "lstm",
                    "input_size": 100,
                    "hidden_size": 100,
                    "num_layers": 1,
                    "dropout": 0.0,
                    "bidirectional": true
                }},
                "attention": {{
                    "type": "bilinear",
                    "vector_dim": 200,
                    "matrix_dim": 200
                }},
                "target_embedding_dim": 30,
                "beam_size": 5,
                "max_decoding_steps": 50,
                "metrics": [
                    {{ "type": "bleu" }},
                    {{ "type": "token_sequence_accuracy" }}
                ]
            }},
            /* bucket by source length to minimise padding */
            "iterator": {{
                "type": "bucket",
                "batch_size": 32,
                "sorting_keys": [["source_tokens", "num_tokens"]],
                "padding_noise": 0.2
            }},
            "trainer": {{
                "optimizer": {{ "type": "adam", "lr": 0.001 }},
                "learning_rate_scheduler": {{
                    "type": "cosine",
                    "t_initial": 5,
                    "t_mul": 1.5,
                    "eta_mul": 0.9
                }},
                "num_epochs": 80,
                "patience": 10,
                "cuda_device": -1,
                "validation_metric": "+BLEU"
            }}
        }}"#,
        train = workspace.train.display().to_string(),
        validation = workspace.validation.display().to_string(),
    )
}
