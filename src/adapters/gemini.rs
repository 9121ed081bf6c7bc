//! Gemini `generateContent` client.
//!
//! Used both to write scripts and to grade artifacts; the two differ only in
//! prompt and generation parameters.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{ensure_success, read_json, transport};
use super::{CallResult, CollaboratorError, TextGenerator};
use crate::core::pipeline::GenerationParams;

const SERVICE: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Build the generateContent URL
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// The key travels in a header so it never appears in a URL
    fn request(&self, prompt: &str, params: GenerationParams) -> RequestBuilder {
        self.client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_request(prompt, params))
    }
}

fn build_request(prompt: &str, params: GenerationParams) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        },
    }
}

/// First fragment of the first candidate
fn first_fragment(response: GenerateContentResponse) -> CallResult<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| CollaboratorError::empty(SERVICE, "no candidates in response"))
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> CallResult<String> {
        debug!(
            model = %self.model,
            temperature = params.temperature,
            max_output_tokens = params.max_output_tokens,
            "Calling generateContent"
        );

        let response = self
            .request(prompt, params)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let response = ensure_success(SERVICE, response).await?;
        let parsed: GenerateContentResponse = read_json(SERVICE, response).await?;
        first_fragment(parsed)
    }
}
