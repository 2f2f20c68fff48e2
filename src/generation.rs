use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Format the collaborator must answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A JSON document, constrained by `GenerationConfig::response_schema` when set.
    Json,
}

impl ResponseFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
        }
    }
}

/// Sampling and output settings sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_format: ResponseFormat,
    /// Schema the JSON answer must follow.
    pub response_schema: Option<Value>,
}

/// One complete call to a text generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub config: GenerationConfig,
}

/// Trait representing a text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name of the service, for logs.
    fn name(&self) -> &str;

    /// Send the request and return the raw text body of the answer.
    ///
    /// An empty string is a valid return; judging the body is up to the caller.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String>;
}
