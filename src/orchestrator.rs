use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::error::SpecError;
use crate::generation::{GenerationConfig, GenerationRequest, ResponseFormat, TextGenerator};
use crate::prompt;

pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 0.95;
pub const TOP_K: u32 = 40;
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// A product description that passed the non-empty check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDescription(String);

impl ProductDescription {
    /// Accepts any text that is not empty after trimming. The text is kept untrimmed.
    pub fn new(text: impl Into<String>) -> Result<Self, SpecError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SpecError::Validation);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The two bullet-point texts returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationResult {
    pub english_specs: String,
    pub arabic_specs: String,
}

/// Turns a description into a validated `SpecificationResult` with one request.
pub struct RequestOrchestrator {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl RequestOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, description: &ProductDescription) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt: prompt::build_prompt(description.as_str()),
            config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_format: ResponseFormat::Json,
                response_schema: Some(prompt::response_schema()),
            },
        }
    }

    /// Run one generation. Never retries.
    pub async fn generate(
        &self,
        description: &ProductDescription,
    ) -> Result<SpecificationResult, SpecError> {
        let request = self.build_request(description);
        info!(
            "Requesting specifications from {} ({}), prompt length {}",
            self.generator.name(),
            self.model,
            request.prompt.len()
        );

        let body = self.generator.generate_text(&request).await.map_err(|e| {
            warn!("{} call failed: {:#}", self.generator.name(), e);
            SpecError::generation(e)
        })?;
        debug!("Received {} bytes from {}", body.len(), self.generator.name());

        let result = parse_response(&body);
        if let Err(e) = &result {
            warn!("Rejected response: {}", e);
        }
        result
    }
}

/// Validate a raw response body: non-empty, then JSON, then the two-string shape.
pub fn parse_response(body: &str) -> Result<SpecificationResult, SpecError> {
    if body.trim().is_empty() {
        return Err(SpecError::EmptyResponse);
    }
    let value: serde_json::Value = serde_json::from_str(body).map_err(SpecError::MalformedJson)?;
    let Some(object) = value.as_object() else {
        return Err(SpecError::SchemaViolation("expected a JSON object".to_string()));
    };
    let field = |name: &str| {
        object
            .get(name)
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SpecError::SchemaViolation(format!("missing or non-string `{}`", name)))
    };
    Ok(SpecificationResult {
        english_specs: field(prompt::ENGLISH_FIELD)?,
        arabic_specs: field(prompt::ARABIC_FIELD)?,
    })
}
