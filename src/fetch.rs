//! Lazy acquisition of pretrained artefacts.
//!
//! Resolution never downloads anything; a component holding a
//! [`PretrainedResource`] calls [`PretrainedResource::acquire`] at first
//! use. Remote fetches retry a bounded number of times with exponential
//! backoff and a per-request timeout; a temporary download handle is
//! released on every exit path. Local artefacts are only checked for
//! existence and, when a digest is recorded, verified.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::components::{PretrainedResource, ResourceLocation};

/// A pretrained artefact could not be made available.
#[derive(Debug, Error)]
pub enum ResourceUnavailableError {
    /// Every fetch attempt failed.
    #[error("{url}: fetch failed after {attempts} attempt(s): {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },
    /// A local artefact path does not exist.
    #[error("{path}: no such pretrained artefact")]
    Missing { path: PathBuf },
    /// Reading an artefact failed.
    #[error("failed to read artefact at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The artefact's digest does not match the recorded one. Terminal: a
    /// retry would download the same bytes.
    #[error("{location} expected SHA-256 {expected} but found {actual}")]
    ChecksumMismatch {
        location: String,
        expected: String,
        actual: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to construct HTTP client: {0}")]
    Client(String),
}

/// Retry and timeout policy for remote acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts before giving up. At least 1.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per subsequent attempt.
    pub initial_backoff: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Handle to an acquired artefact.
///
/// For remote artefacts the handle owns the temporary download; dropping it
/// releases the file. Local artefacts are referenced in place.
#[derive(Debug)]
pub struct FetchedResource {
    path: PathBuf,
    _download: Option<NamedTempFile>,
}

impl FetchedResource {
    /// Filesystem location of the acquired artefact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PretrainedResource {
    /// Make the artefact available on the local filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceUnavailableError`] when a local artefact is missing
    /// or unreadable, when a remote fetch exhausts its retry budget, or when
    /// the digest does not match the recorded `sha256`.
    pub fn acquire(&self, policy: &FetchPolicy) -> Result<FetchedResource, ResourceUnavailableError> {
        match &self.location {
            ResourceLocation::Local(path) => {
                if !path.exists() {
                    return Err(ResourceUnavailableError::Missing { path: path.clone() });
                }
                if let Some(expected) = &self.sha256 {
                    verify_checksum(path, expected, self.location.as_str())?;
                }
                Ok(FetchedResource {
                    path: path.clone(),
                    _download: None,
                })
            }
            ResourceLocation::Remote(url) => {
                let download = fetch_with_retries(url, policy)?;
                if let Some(expected) = &self.sha256 {
                    verify_checksum(download.path(), expected, url)?;
                }
                Ok(FetchedResource {
                    path: download.path().to_path_buf(),
                    _download: Some(download),
                })
            }
        }
    }
}

fn fetch_with_retries(
    url: &str,
    policy: &FetchPolicy,
) -> Result<NamedTempFile, ResourceUnavailableError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(policy.timeout)
        .build()
        .map_err(|source| ResourceUnavailableError::Client(source.to_string()))?;

    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut last_message = String::new();
    for attempt in 1..=attempts {
        if attempt > 1 {
            std::thread::sleep(backoff);
            backoff = backoff.saturating_mul(2);
        }
        debug!(url, attempt, "fetching pretrained artefact");
        match fetch_once(&client, url) {
            Ok(download) => return Ok(download),
            Err(message) => {
                warn!(url, attempt, %message, "fetch attempt failed");
                last_message = message;
            }
        }
    }
    Err(ResourceUnavailableError::RetriesExhausted {
        url: url.to_owned(),
        attempts,
        message: last_message,
    })
}

fn fetch_once(client: &reqwest::blocking::Client, url: &str) -> Result<NamedTempFile, String> {
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| source.to_string())?;
    let mut download = NamedTempFile::new().map_err(|source| source.to_string())?;
    response
        .copy_to(&mut download)
        .map_err(|source| source.to_string())?;
    download
        .flush()
        .map_err(|source| source.to_string())?;
    Ok(download)
}

fn verify_checksum(
    path: &Path,
    expected: &str,
    location: &str,
) -> Result<(), ResourceUnavailableError> {
    let actual = compute_sha256(path)?;
    let expected = expected.trim().to_ascii_lowercase();
    if actual == expected {
        Ok(())
    } else {
        Err(ResourceUnavailableError::ChecksumMismatch {
            location: location.to_owned(),
            expected,
            actual,
        })
    }
}

/// Streaming SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns I/O errors from opening or reading the file.
pub fn compute_sha256(path: &Path) -> Result<String, ResourceUnavailableError> {
    let file = File::open(path).map_err(|source| ResourceUnavailableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|source| ResourceUnavailableError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
