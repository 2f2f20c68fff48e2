use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::credentials::CredentialProvider;
use crate::generation::{GenerationRequest, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client.
///
/// The HTTP client is reused across calls; the API key is not. It is fetched from
/// the credential provider for every request.
pub struct GeminiProvider {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetails {
    message: String,
    status: Option<String>,
    code: Option<u16>,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self
            .credentials
            .current_credential()
            .context("No Gemini API key available")?;

        let body = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: WireGenerationConfig {
                temperature: request.config.temperature,
                top_p: request.config.top_p,
                top_k: request.config.top_k,
                max_output_tokens: request.config.max_output_tokens,
                response_mime_type: request.config.response_format.mime_type(),
                response_schema: request.config.response_schema.as_ref(),
            },
        };

        debug!("POST {}", self.endpoint(&request.model));
        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Gemini response body")?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<GeminiError>(&response_text) {
                return Err(anyhow!(
                    "Gemini API error: {} (status: {}, code: {:?})",
                    error_response.error.message,
                    error_response.error.status.as_deref().unwrap_or("unknown"),
                    error_response.error.code
                ));
            }
            return Err(anyhow!(
                "Gemini API error (status {}): {}",
                status,
                response_text
            ));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).context("Failed to parse Gemini response")?;

        if let Some(reason) = gemini_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            warn!("Gemini blocked the prompt: {}", reason);
        }

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                "Gemini token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        let Some(candidate) = gemini_response.candidates.into_iter().next() else {
            warn!("Gemini returned no candidates");
            return Ok(String::new());
        };

        if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
            warn!(
                "Gemini response was truncated at the {} token limit. Response may be incomplete.",
                request.config.max_output_tokens
            );
        }

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}
