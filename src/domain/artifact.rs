//! Media artifact references passed between collaborators.
//!
//! Collaborators disagree on how they hand media around: some return a
//! downloadable link, others the payload itself. The orchestrator never looks
//! inside either form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to an audio, video or merged media artifact
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ArtifactRef {
    /// Artifact lives behind a URL
    Url(String),

    /// Artifact payload held in memory
    Inline(Vec<u8>),
}

impl ArtifactRef {
    /// Create a by-reference artifact
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Create a by-value artifact
    pub fn inline(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Inline(bytes.into())
    }

    /// Returns the URL if this artifact is held by reference
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Inline(_) => None,
        }
    }

    /// Returns the payload if this artifact is held by value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Url(_) => None,
            Self::Inline(bytes) => Some(bytes),
        }
    }

    /// True when the reference carries nothing usable
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Url(url) => url.trim().is_empty(),
            Self::Inline(bytes) => bytes.is_empty(),
        }
    }
}

// Inline payloads can be megabytes; never dump them into logs.
impl fmt::Debug for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Inline(bytes) => write!(f, "Inline({} bytes)", bytes.len()),
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Inline(bytes) => write!(f, "<inline media, {} bytes>", bytes.len()),
        }
    }
}
