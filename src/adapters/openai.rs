use crate::core::{CompletionClient, CompletionRequest, ConfigProvider};
use crate::utils::error::{AgentError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI 相容的 chat completions 用戶端
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// 沒有 API key 時回傳 None，呼叫端改用規則式回覆
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Option<Self>> {
        match config.api_key().filter(|_| config.has_credential()) {
            Some(key) => Ok(Some(Self::new(
                config.api_base(),
                key.trim(),
                config.model(),
                config.timeout_seconds(),
            )?)),
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn api_error(status: StatusCode, body: &str) -> AgentError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let error_obj = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|v| v.as_object());

    let message = match error_obj {
        Some(obj) => {
            let error_type = obj
                .get("type")
                .or_else(|| obj.get("code"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let error_message = obj
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");

            match error_type {
                "insufficient_quota" => format!("Quota exceeded: {}", error_message),
                "invalid_request_error" => format!("Request error: {}", error_message),
                "authentication_error" | "invalid_api_key" => {
                    format!("Authentication failed: {}", error_message)
                }
                _ => error_message.to_string(),
            }
        }
        None => format!("Unexpected response: {}", body.trim()),
    };

    AgentError::ApiError {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            "📡 Sending completion request to {} ({} prompt chars)",
            self.endpoint,
            request.user.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 Completion API response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        let parsed: ChatResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AgentError::EmptyCompletionError)
    }
}
