use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{LlmError, LlmProvider, LlmRequest};

pub mod parser;
pub mod prompts;

pub use prompts::QueryIntent;

/// One story parsed out of an upstream reply. Not persisted; `id` is fresh per fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("query must not be empty")]
    InvalidQuery,

    #[error("upstream rejected credentials: {0}")]
    Auth(String),

    #[error("upstream refused the request: {0}")]
    Forbidden(String),

    #[error("upstream rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("no response from upstream: {0}")]
    Transport(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("upstream reply contained no news items")]
    NoResults,

    #[error("upstream returned an empty summary")]
    SummaryUnavailable,
}

impl GatewayError {
    /// Stable identifier for API clients
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidQuery => "invalid_query",
            GatewayError::Auth(_) => "auth",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::RateLimited(_) => "rate_limited",
            GatewayError::Upstream { .. } => "upstream",
            GatewayError::Transport(_) => "transport",
            GatewayError::MalformedResponse(_) => "malformed_response",
            GatewayError::NoResults => "no_results",
            GatewayError::SummaryUnavailable => "summary_unavailable",
        }
    }
}

impl From<LlmError> for GatewayError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Unauthorized(m) => GatewayError::Auth(m),
            LlmError::Forbidden(m) => GatewayError::Forbidden(m),
            LlmError::RateLimited(m) => GatewayError::RateLimited(m),
            LlmError::Api { status, message } => GatewayError::Upstream { status, message },
            LlmError::Transport(m) => GatewayError::Transport(m),
            LlmError::MalformedResponse(m) => GatewayError::MalformedResponse(m),
        }
    }
}

/// Translates a query into one chat-completion call and parses the reply.
#[derive(Clone)]
pub struct NewsGateway {
    provider: Arc<dyn LlmProvider>,
    news_max_tokens: usize,
    summary_max_tokens: usize,
}

impl NewsGateway {
    pub const NEWS_MAX_TOKENS: usize = 150;
    pub const SUMMARY_MAX_TOKENS: usize = 200;

    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            news_max_tokens: Self::NEWS_MAX_TOKENS,
            summary_max_tokens: Self::SUMMARY_MAX_TOKENS,
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub async fn fetch_news(&self, query: &str) -> Result<Vec<NewsItem>, GatewayError> {
        if query.trim().is_empty() {
            return Err(GatewayError::InvalidQuery);
        }

        let intent = QueryIntent::classify(query);
        let request = LlmRequest::new(intent.prompt())
            .with_system(prompts::SYSTEM_PERSONA)
            .with_max_tokens(self.news_max_tokens);

        let response = self.provider.generate(request).await.map_err(|e| {
            warn!(query, intent = intent.label(), error = %e, "news request failed");
            GatewayError::from(e)
        })?;

        let items = parser::parse_news_lines(&response.content, Utc::now().date_naive());
        if items.is_empty() {
            warn!(query, intent = intent.label(), "upstream reply had no parseable lines");
            return Err(GatewayError::NoResults);
        }

        info!(query, intent = intent.label(), items = items.len(), "news fetched");
        Ok(items)
    }

    pub async fn latest_news(&self) -> Result<Vec<NewsItem>, GatewayError> {
        self.fetch_news(prompts::LATEST_NEWS_QUERY).await
    }

    pub async fn upcoming_matches(&self) -> Result<Vec<NewsItem>, GatewayError> {
        self.fetch_news(prompts::UPCOMING_MATCHES_QUERY).await
    }

    /// Detailed write-up for a single headline, returned as raw text.
    pub async fn summarize(&self, title: &str) -> Result<String, GatewayError> {
        if title.trim().is_empty() {
            return Err(GatewayError::InvalidQuery);
        }

        let request = LlmRequest::new(prompts::summary_prompt(title))
            .with_system(prompts::SYSTEM_PERSONA)
            .with_max_tokens(self.summary_max_tokens);

        let response = self.provider.generate(request).await.map_err(|e| {
            warn!(title, error = %e, "summary request failed");
            GatewayError::from(e)
        })?;

        let summary = response.content.trim();
        if summary.is_empty() {
            warn!(title, "upstream returned an empty summary");
            return Err(GatewayError::SummaryUnavailable);
        }

        info!(title, chars = summary.len(), "summary fetched");
        Ok(summary.to_string())
    }
}
