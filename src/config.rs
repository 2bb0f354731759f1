//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `FALCON_WORK_DIR` and
//! `FALCON_LOG_LEVEL` env overrides. `LLM_API_KEY` is read from the
//! environment only and never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;
use crate::router::Capabilities;

/// Default number of lines kept in short-term history.
pub const DEFAULT_HISTORY_CAP: usize = 5;

/// Memory configuration (`[memory]`).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Long-term memory file, already resolved against `work_dir`.
    pub long_term_file: PathBuf,
    /// Maximum number of `Q:`/`A:` lines kept in short-term history.
    pub history_cap: usize,
}

/// Router configuration (`[router]`).
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub capabilities: Capabilities,
    /// Search URL template; `{query}` is replaced by the URL-encoded query.
    pub search_url: String,
    /// Per-request HTTP timeout for the search handler.
    pub search_timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"mock"` or `"openai"`).
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    /// Config for the OpenAI-compatible provider (`[llm.openai]`).
    pub openai: OpenAiConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub memory: MemoryConfig,
    pub router: RouterConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY`; `None` for the mock provider or keyless
    /// local servers.
    pub llm_api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    chat: RawChat,
    #[serde(default)]
    memory: RawMemory,
    #[serde(default)]
    router: RawRouter,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawChat {
    #[serde(default = "default_bot_name")]
    bot_name: String,
    #[serde(default = "default_work_dir")]
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawMemory {
    #[serde(default = "default_long_term_file")]
    long_term_file: String,
    #[serde(default = "default_history_cap")]
    history_cap: usize,
}

impl Default for RawMemory {
    fn default() -> Self {
        Self {
            long_term_file: default_long_term_file(),
            history_cap: default_history_cap(),
        }
    }
}

#[derive(Deserialize)]
struct RawRouter {
    #[serde(default = "default_true")]
    arithmetic: bool,
    /// Defaults to `false`: only the mock variant ships with search on.
    #[serde(default = "default_false")]
    web_search: bool,
    #[serde(default = "default_search_url")]
    search_url: String,
    #[serde(default = "default_search_timeout_seconds")]
    search_timeout_seconds: u64,
}

impl Default for RawRouter {
    fn default() -> Self {
        Self {
            arithmetic: true,
            web_search: false,
            search_url: default_search_url(),
            search_timeout_seconds: default_search_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_bot_name() -> String { "Falcon Chat".to_string() }
fn default_work_dir() -> String { "~/.falcon-chat".to_string() }
fn default_log_level() -> String { "warn".to_string() }
fn default_long_term_file() -> String { "long_term_memory.json".to_string() }
fn default_history_cap() -> usize { DEFAULT_HISTORY_CAP }
fn default_search_url() -> String { "https://www.google.com/search?q={query}".to_string() }
fn default_search_timeout_seconds() -> u64 { 10 }
fn default_llm_provider() -> String { "mock".to_string() }
fn default_openai_api_base_url() -> String { "http://localhost:11434/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "falcon:7b-instruct".to_string() }
fn default_openai_temperature() -> f32 { 0.7 }
fn default_openai_max_tokens() -> u32 { 50 }
fn default_openai_timeout_seconds() -> u64 { 120 }

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let work_dir_override = env::var("FALCON_WORK_DIR").ok();
    let log_level_override = env::var("FALCON_LOG_LEVEL").ok();
    let mut config = load_from(
        Path::new(path.unwrap_or("config/default.toml")),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )?;
    config.llm_api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());
    Ok(config)
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let c = parsed.chat;

    let work_dir = expand_home(work_dir_override.unwrap_or(&c.work_dir));
    let log_level = log_level_override.unwrap_or(&c.log_level).to_string();
    logger::parse_level(&log_level).map_err(|e| AppError::Config(e.to_string()))?;

    if parsed.memory.history_cap == 0 {
        return Err(AppError::Config("memory.history_cap must be at least 1".into()));
    }
    if parsed.router.web_search && !parsed.router.search_url.contains("{query}") {
        return Err(AppError::Config(
            "router.search_url must contain a {query} placeholder".into(),
        ));
    }

    let long_term_file = {
        let p = expand_home(&parsed.memory.long_term_file);
        if p.is_absolute() { p } else { work_dir.join(p) }
    };

    Ok(Config {
        bot_name: c.bot_name,
        work_dir,
        log_level,
        memory: MemoryConfig {
            long_term_file,
            history_cap: parsed.memory.history_cap,
        },
        router: RouterConfig {
            capabilities: Capabilities {
                arithmetic: parsed.router.arithmetic,
                web_search: parsed.router.web_search,
            },
            search_url: parsed.router.search_url,
            search_timeout_seconds: parsed.router.search_timeout_seconds,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                max_tokens: parsed.llm.openai.max_tokens,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: None,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests — mock LLM, search on, no API key, everything
    /// persisted under `work_dir`.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            bot_name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            memory: MemoryConfig {
                long_term_file: work_dir.join(default_long_term_file()),
                history_cap: DEFAULT_HISTORY_CAP,
            },
            router: RouterConfig {
                capabilities: Capabilities { arithmetic: true, web_search: true },
                search_url: "http://127.0.0.1:0/search?q={query}".into(),
                search_timeout_seconds: 1,
            },
            llm: LlmConfig {
                provider: "mock".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    max_tokens: 16,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}
