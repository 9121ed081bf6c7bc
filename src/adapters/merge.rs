//! Audio/video merge service client.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{ensure_success, read_json, transport};
use super::{CallResult, CollaboratorError, MediaMerger};
use crate::domain::ArtifactRef;

const SERVICE: &str = "merge";

/// Merge service REST client
pub struct MergeServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct MergeRequest {
    video_url: String,
    audio_url: String,
    start_offset: i64,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    output_url: String,
}

impl MergeServiceClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/merge", self.base_url.trim_end_matches('/'))
    }
}

/// URLs go over the wire as-is; inline payloads as base64
fn encode_ref(artifact: &ArtifactRef) -> String {
    match artifact {
        ArtifactRef::Url(url) => url.clone(),
        ArtifactRef::Inline(bytes) => STANDARD.encode(bytes),
    }
}

fn build_request(audio: &ArtifactRef, video: &ArtifactRef, start_offset: i64) -> MergeRequest {
    MergeRequest {
        video_url: encode_ref(video),
        audio_url: encode_ref(audio),
        start_offset,
    }
}

fn output_of(response: MergeResponse) -> CallResult<ArtifactRef> {
    if response.output_url.trim().is_empty() {
        return Err(CollaboratorError::empty(SERVICE, "no output_url in response"));
    }
    Ok(ArtifactRef::Url(response.output_url))
}

#[async_trait]
impl MediaMerger for MergeServiceClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn merge(
        &self,
        audio: &ArtifactRef,
        video: &ArtifactRef,
        start_offset: i64,
    ) -> CallResult<ArtifactRef> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&build_request(audio, video, start_offset))
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let response = ensure_success(SERVICE, response).await?;
        let parsed: MergeResponse = read_json(SERVICE, response).await?;
        output_of(parsed)
    }
}
