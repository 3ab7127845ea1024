use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LlmError, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};

/// Remote LLM provider using OpenAI-compatible HTTP API
pub struct RemoteLlmProvider {
    base_url: String,
    api_key: String,
    model: String,
    default_timeout: Option<Duration>,
    default_max_tokens: usize,
    default_temperature: Option<f32>,
    client: reqwest::Client,
}

impl RemoteLlmProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: None,
            default_max_tokens: 150,
            default_temperature: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override request defaults. `timeout_secs = None` keeps the HTTP client default.
    pub fn with_defaults(
        mut self,
        timeout_secs: Option<u64>,
        max_tokens: usize,
        temperature: Option<f32>,
    ) -> Self {
        self.default_timeout = timeout_secs.map(Duration::from_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    async fn send(&self, body: &OpenAiRequest) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl LlmProvider for RemoteLlmProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(Message {
                role: "system".to_string(),
                content: Some(system),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: Some(request.prompt),
        });

        let req_body = OpenAiRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens.unwrap_or(self.default_max_tokens)),
            temperature: request.temperature.or(self.default_temperature),
        };

        let exchange = async {
            let response = self
                .send(&req_body)
                .await
                .map_err(|e| LlmError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::Transport(format!("failed to read response body: {}", e)))?;
            Ok::<_, LlmError>((status, body))
        };

        let (status, body) = match self.default_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                LlmError::Transport(format!("LLM request timed out after {}s", limit.as_secs()))
            })??,
            None => exchange.await?,
        };

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        let resp_body: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let choice = resp_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))?;

        let usage = resp_body
            .usage
            .map(|u| UsageMetadata {
                prompt_tokens: u.prompt_tokens.unwrap_or(0),
                completion_tokens: u.completion_tokens.unwrap_or(0),
                total_tokens: u.total_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "chat completion received"
        );

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: resp_body.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a non-2xx status to the error taxonomy, preferring the upstream `error.message`.
pub fn classify_failure(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 => LlmError::Unauthorized(message),
        403 => LlmError::Forbidden(message),
        429 => LlmError::RateLimited(message),
        _ => LlmError::Api { status, message },
    }
}

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
