//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.
//! Adding a new backend = new module + new match arm.

pub mod mock;
#[cfg(feature = "provider-openai")]
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
#[cfg_attr(not(feature = "provider-openai"), allow(unused_variables))]
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "mock" => Ok(LlmProvider::Mock(mock::MockProvider)),
        #[cfg(feature = "provider-openai")]
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.max_tokens,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::Path;

    #[test]
    fn builds_mock() {
        let cfg = Config::test_default(Path::new("/tmp"));
        let p = build(&cfg.llm, None).unwrap();
        assert_eq!(p.name(), "mock");
    }

    #[cfg(feature = "provider-openai")]
    #[test]
    fn builds_openai() {
        let mut cfg = Config::test_default(Path::new("/tmp"));
        cfg.llm.provider = "openai".into();
        let p = build(&cfg.llm, Some("sk-test".into())).unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default(Path::new("/tmp"));
        cfg.llm.provider = "falcon-local-gpu".into();
        let err = build(&cfg.llm, None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(ref n) if n == "falcon-local-gpu"));
    }

    #[test]
    fn provider_names_are_exact() {
        let mut cfg = Config::test_default(Path::new("/tmp"));
        cfg.llm.provider = "dummy".into();
        assert!(matches!(build(&cfg.llm, None), Err(ProviderError::UnknownProvider(_))));
    }
}
