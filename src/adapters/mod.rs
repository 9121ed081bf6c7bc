//! Collaborator interfaces for external services.
//!
//! Each collaborator is one remote capability behind an async trait. A call
//! performs a single request/response exchange and returns either the parsed
//! result or a [`CollaboratorError`]. The orchestrator only sees the traits.

pub mod drive;
pub mod gemini;
pub mod http;
pub mod merge;
pub mod speech;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::pipeline::{GenerationParams, VoiceSettings};
use crate::domain::ArtifactRef;

pub use drive::DriveClient;
pub use gemini::GeminiClient;
pub use http::build_client;
pub use merge::MergeServiceClient;
pub use speech::ElevenLabsClient;

/// Failure of a single collaborator call
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Network error or client-level timeout
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Response body could not be decoded
    #[error("{service} returned a malformed payload: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },

    /// Response parsed but carried no usable result
    #[error("{service} returned no usable result: {detail}")]
    Empty {
        service: &'static str,
        detail: String,
    },
}

impl CollaboratorError {
    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            detail: detail.into(),
        }
    }

    pub fn empty(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Empty {
            service,
            detail: detail.into(),
        }
    }

    /// True when the call hit the client deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// Result alias for collaborator calls
pub type CallResult<T> = Result<T, CollaboratorError>;

/// Text generation; also serves as the quality evaluator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable collaborator name
    fn name(&self) -> &str;

    /// Produce text for a prompt. Returns the first fragment of the first
    /// candidate.
    async fn generate(&self, prompt: &str, params: GenerationParams) -> CallResult<String>;
}

/// Text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str, voice: VoiceSettings) -> CallResult<ArtifactRef>;
}

/// Receipt for a persisted asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub id: String,
    pub name: String,
}

/// Remote storage holding the raw video and receiving the final one
#[async_trait]
pub trait AssetStore: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch a stored asset by id
    async fn fetch(&self, asset_id: &str) -> CallResult<ArtifactRef>;

    /// Store an artifact in a folder under the given file name
    async fn persist(
        &self,
        artifact: &ArtifactRef,
        folder_id: &str,
        file_name: &str,
    ) -> CallResult<StoredAsset>;
}

/// Audio/video merge service
#[async_trait]
pub trait MediaMerger: Send + Sync {
    fn name(&self) -> &str;

    async fn merge(
        &self,
        audio: &ArtifactRef,
        video: &ArtifactRef,
        start_offset: i64,
    ) -> CallResult<ArtifactRef>;
}
