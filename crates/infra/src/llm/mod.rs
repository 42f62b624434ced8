//! LLM client (C9's sibling boundary, consumed by C5 and C8): an
//! OpenAI-compatible chat-completion call with the 60s deadline, a single
//! retry on timeout, `Retry-After`-honoring backoff (capped at 30s) on
//! 429, and fail-soft (no further retry) on 5xx.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;
use tsic_core::ports::{LlmMessage, LlmPort, LlmRole};
use tsic_domain::constants::LLM_DEADLINE_SECONDS;
use tsic_domain::{Result, TsicError};

use crate::http::HttpClient;

const MAX_RETRY_AFTER_SECONDS: u64 = 30;

/// OpenAI-compatible chat-completion client.
pub struct OpenAiLlmClient {
    http: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAiLlmClient {
    /// Builds its own single-attempt `HttpClient` (no automatic 5xx
    /// retry): this module owns the exact retry shape the contract needs.
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(LLM_DEADLINE_SECONDS))
            .max_attempts(1)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.into(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    async fn call_once(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let builder = self
            .http
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(request);
        self.http.send(builder).await
    }
}

#[async_trait::async_trait]
impl LlmPort for OpenAiLlmClient {
    async fn complete(&self, messages: Vec<LlmMessage>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.into_iter().map(ChatMessage::from).collect(),
        };

        let mut response = match self.call_once(&request).await {
            Ok(response) => response,
            Err(TsicError::ProviderTransient { provider, message }) => {
                warn!(provider, message, "llm request timed out, retrying once");
                self.call_once(&request).await?
            }
            Err(other) => return Err(other),
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after_seconds(&response).min(MAX_RETRY_AFTER_SECONDS);
            warn!(wait_seconds = wait, "llm rate limited, honoring Retry-After");
            sleep(Duration::from_secs(wait)).await;
            response = self.call_once(&request).await?;
        }

        if response.status().is_server_error() {
            return Err(TsicError::ProviderTransient {
                provider: "llm".into(),
                message: format!("llm returned {}", response.status()),
            });
        }

        if response.status() == StatusCode::FORBIDDEN {
            return Err(TsicError::ProviderPermission {
                provider: "llm".into(),
                resource: "chat completions".into(),
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TsicError::ProviderTransient {
                provider: "llm".into(),
                message: format!("llm returned {status}: {body}"),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| TsicError::ParseFailure {
            what: "llm response".into(),
            message: e.to_string(),
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| TsicError::ParseFailure {
            what: "llm response".into(),
            message: "response contained no choices".into(),
        })?;

        Ok(choice.message.content)
    }
}

fn retry_after_seconds(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(MAX_RETRY_AFTER_SECONDS)
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<LlmMessage> for ChatMessage {
    fn from(value: LlmMessage) -> Self {
        let role = match value.role {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        };
        Self { role: role.to_string(), content: value.content }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sample_messages() -> Vec<LlmMessage> {
        vec![LlmMessage { role: LlmRole::User, content: "hello".into() }]
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiLlmClient::new("key".into(), "gpt-4o-mini")
            .expect("client")
            .with_api_url(format!("{}/v1/chat/completions", server.uri()));

        let answer = client.complete(sample_messages()).await.expect("completion");
        assert_eq!(answer, "hi there");
    }

    #[tokio::test]
    async fn server_error_maps_to_provider_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let client = OpenAiLlmClient::new("key".into(), "gpt-4o-mini")
            .expect("client")
            .with_api_url(server.uri());

        let err = client.complete(sample_messages()).await.unwrap_err();
        assert!(matches!(err, TsicError::ProviderTransient { .. }));
    }
}
