//! ElevenLabs text-to-speech client.
//!
//! The service may answer with raw audio bytes or with a JSON document that
//! either embeds the audio (base64 `file`) or links to it (`audio_url`). All
//! three shapes are accepted.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{ensure_success, transport};
use super::{CallResult, CollaboratorError, SpeechSynthesizer};
use crate::core::pipeline::VoiceSettings;
use crate::domain::ArtifactRef;

const SERVICE: &str = "tts";

/// Text-to-speech REST client
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpeechPayload {
    Inline { file: String },
    Linked { audio_url: String },
}

impl ElevenLabsClient {
    pub fn new(client: Client, api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Decode a speech response by its content type
fn decode_response(content_type: Option<&str>, body: &[u8]) -> CallResult<ArtifactRef> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    let artifact = if is_json {
        let payload: SpeechPayload = serde_json::from_slice(body)
            .map_err(|e| CollaboratorError::malformed(SERVICE, e.to_string()))?;
        match payload {
            SpeechPayload::Inline { file } => {
                let bytes = STANDARD
                    .decode(file.trim())
                    .map_err(|e| CollaboratorError::malformed(SERVICE, format!("bad base64 audio: {}", e)))?;
                ArtifactRef::Inline(bytes)
            }
            SpeechPayload::Linked { audio_url } => ArtifactRef::Url(audio_url),
        }
    } else {
        ArtifactRef::Inline(body.to_vec())
    };

    if artifact.is_empty() {
        return Err(CollaboratorError::empty(SERVICE, "no audio in response"));
    }
    Ok(artifact)
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn synthesize(&self, text: &str, voice: VoiceSettings) -> CallResult<ArtifactRef> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SpeechRequest {
                text,
                voice_settings: voice,
            })
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let response = ensure_success(SERVICE, response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(transport(SERVICE))?;

        decode_response(content_type.as_deref(), &body)
    }
}
