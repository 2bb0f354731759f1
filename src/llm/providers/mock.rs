//! Mock provider — canned placeholder reply, no model behind it.
//! Used by the mock variant and for exercising the router without a backend.

use crate::llm::{GenerationRequest, ProviderError};

#[derive(Debug, Clone)]
pub struct MockProvider;

impl MockProvider {
    pub async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, ProviderError> {
        Ok(format!("Mock response for: {}", request.input))
    }
}
