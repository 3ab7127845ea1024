use thiserror::Error;

/// Core trait for chat-completion providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model identifier sent upstream
    fn model(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// Optional system persona, sent as the first message
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Failures of a single upstream call. None of them are retried.
#[derive(Debug, Error)]
pub enum LlmError {
    /// 401: the upstream rejected our credentials
    #[error("upstream rejected credentials: {0}")]
    Unauthorized(String),

    /// 403
    #[error("upstream refused the request: {0}")]
    Forbidden(String),

    /// 429
    #[error("upstream rate limit exceeded: {0}")]
    RateLimited(String),

    /// Any other non-2xx status
    #[error("upstream error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// No response was received (connect failure, timeout, truncated body)
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// 2xx whose body is not a chat-completion document
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

pub mod remote;
