//! Query router — classifies a user line and dispatches it to a handler.
//!
//! ```text
//! input ─► arithmetic?  (contains + - * /)        ─► arithmetic::evaluate
//!       ─► search?      (starts with "search")    ─► SearchHandler
//!       ─► otherwise                              ─► LlmProvider
//! ```
//!
//! First match wins. Which branches exist is decided by [`Capabilities`], so
//! the full and mock front-ends share this one router.
//!
//! [`Router::route`] never fails: evaluation, network and generation errors
//! come back as reply text so the console always has something to print.

pub mod arithmetic;
pub mod search;

use tracing::{debug, warn};

use crate::config::RouterConfig;
use crate::error::AppError;
use crate::llm::{GenerationRequest, LlmProvider};
use crate::memory::Speaker;
use crate::session::Session;

pub use search::SearchHandler;

/// Reply given for empty or whitespace-only input.
pub const EMPTY_INPUT_PROMPT: &str = "Please enter a question.";

/// Characters that send a line down the arithmetic path.
const ARITHMETIC_OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Leading keyword of a web-search request, matched case-insensitively.
const SEARCH_KEYWORD: &str = "search";

/// Optional handler branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub arithmetic: bool,
    pub web_search: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { arithmetic: true, web_search: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Input was rejected before routing; history untouched.
    Prompt,
    Arithmetic,
    Search,
    Generated,
}

/// Router output. `text` is always displayable, failures included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

/// Classification of a non-empty line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Arithmetic,
    Search { query: &'a str },
    Generate,
}

pub struct Router {
    capabilities: Capabilities,
    search: Option<SearchHandler>,
    llm: LlmProvider,
}

impl Router {
    /// The search branch is live only when `capabilities.web_search` is set
    /// and a handler is supplied.
    pub fn new(capabilities: Capabilities, search: Option<SearchHandler>, llm: LlmProvider) -> Self {
        Self { capabilities, search, llm }
    }

    pub fn from_config(config: &RouterConfig, llm: LlmProvider) -> Result<Self, AppError> {
        let search = if config.capabilities.web_search {
            Some(SearchHandler::new(config.search_url.clone(), config.search_timeout_seconds)?)
        } else {
            None
        };
        Ok(Self::new(config.capabilities, search, llm))
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Pick the handler for `input`. Does not look at history.
    pub fn classify<'a>(&self, input: &'a str) -> Route<'a> {
        if self.capabilities.arithmetic && input.contains(ARITHMETIC_OPERATORS) {
            return Route::Arithmetic;
        }
        if self.capabilities.web_search && self.search.is_some() {
            if let Some(query) = search_query(input) {
                return Route::Search { query };
            }
        }
        Route::Generate
    }

    /// Answer one user line and record the exchange in `session.history`.
    pub async fn route(&self, input: &str, session: &mut Session) -> Reply {
        if input.trim().is_empty() {
            return Reply { kind: ReplyKind::Prompt, text: EMPTY_INPUT_PROMPT.to_string() };
        }

        session.history.push(Speaker::Question, input);

        let route = self.classify(input);
        debug!(?route, "routing input");

        let (kind, text) = match route {
            Route::Arithmetic => (ReplyKind::Arithmetic, answer_math(input)),
            Route::Search { query } => {
                let text = match &self.search {
                    Some(handler) => handler.search(query).await,
                    None => "Error while performing the search: web search is not configured".to_string(),
                };
                (ReplyKind::Search, text)
            }
            Route::Generate => {
                let context = session.history.context();
                let request = GenerationRequest { input, context: &context };
                let text = match self.llm.complete(request).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(provider = self.llm.name(), error = %e, "generation failed");
                        format!("An error occurred while generating the response: {e}")
                    }
                };
                (ReplyKind::Generated, text)
            }
        };

        session.history.push(Speaker::Answer, &text);
        Reply { kind, text }
    }
}

/// Query text after the `search` keyword, trimmed, if `input` is a search.
fn search_query(input: &str) -> Option<&str> {
    let head = input.get(..SEARCH_KEYWORD.len())?;
    if !head.eq_ignore_ascii_case(SEARCH_KEYWORD) {
        return None;
    }
    Some(input[SEARCH_KEYWORD.len()..].trim())
}

fn answer_math(input: &str) -> String {
    let expression: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    match arithmetic::evaluate(&expression) {
        Ok(value) => format!("The answer is {value}."),
        Err(e) => {
            debug!(%expression, error = %e, "arithmetic evaluation failed");
            format!("Sorry, I couldn't evaluate the question. Error: {e}")
        }
    }
}
