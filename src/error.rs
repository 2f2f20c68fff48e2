use thiserror::Error;

/// Failures a generation attempt can end in.
///
/// The `Display` text of each variant is what the user sees in the error banner.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The description was empty or whitespace-only. Raised before any request.
    #[error("Please enter a product description.")]
    Validation,

    #[error("No content received from the AI service. Please try again.")]
    EmptyResponse,

    #[error("The AI service returned malformed content that could not be parsed as JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("The AI service returned an invalid structure: {0}")]
    SchemaViolation(String),

    /// Anything the collaborator itself reported: network, auth, quota, HTTP status.
    #[error("Failed to generate specifications: {0}")]
    Generation(String),
}

impl SpecError {
    /// Wrap a collaborator failure, keeping its whole context chain in the message.
    pub fn generation(err: anyhow::Error) -> Self {
        SpecError::Generation(format!("{:#}", err))
    }
}
