//! Pretrained artefact references.
//!
//! Embedding tables, wordpiece vocabularies, and transformer weights are
//! opaque blobs selected by location. Resolution never touches them; the
//! component holding a [`PretrainedResource`] acquires it lazily at first
//! use (see the `fetch` module).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a pretrained artefact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceLocation {
    /// An `http`/`https` URL, fetched on first use.
    Remote(String),
    /// A path on the local filesystem.
    Local(PathBuf),
}

impl ResourceLocation {
    /// Classify a raw location string. Anything that is not an `http(s)` URL
    /// is treated as a local path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Remote(raw.to_owned())
        } else {
            Self::Local(PathBuf::from(raw))
        }
    }

    /// Whether acquiring this location requires a network fetch.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The local path, when there is one.
    #[must_use]
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Remote(_) => None,
            Self::Local(path) => Some(path),
        }
    }

    /// The location as it appeared in the document.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(url) => url,
            Self::Local(path) => path.to_str().unwrap_or(""),
        }
    }
}

impl std::fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pretrained artefact reference with an optional expected checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PretrainedResource {
    pub location: ResourceLocation,
    /// Expected SHA-256 digest, lowercase hexadecimal. Verified at
    /// acquisition when present.
    pub sha256: Option<String>,
}

impl PretrainedResource {
    /// Reference an artefact by raw location string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            location: ResourceLocation::parse(raw),
            sha256: None,
        }
    }

    /// Attach an expected SHA-256 digest.
    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }
}
