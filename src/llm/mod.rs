//! LLM provider abstraction — the generation handler behind the router.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Request ───────────────────────────────────────────────────────────────────

/// What the router hands to a provider.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// The raw user line for this turn.
    pub input: &'a str,
    /// Recent history joined by newlines; already ends with this turn's `Q:` line.
    pub context: &'a str,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch keeps the router free of `dyn` trait objects.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Mock(providers::mock::MockProvider),
    #[cfg(feature = "provider-openai")]
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Produce a single completion for `request`.
    pub async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Mock(p) => p.complete(request).await,
            #[cfg(feature = "provider-openai")]
            LlmProvider::OpenAiCompatible(p) => p.complete(request.context).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Mock(_) => "mock",
            #[cfg(feature = "provider-openai")]
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}
