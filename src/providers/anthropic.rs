// Anthropic Messages API provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{ProviderMessage, ProviderRequest, ProviderResponse, Role};
use super::LlmProvider;
use crate::tools::types::{ContentBlock, ToolDefinition};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Anthropic API provider
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            default_model: "claude-3-5-sonnet-latest".to_string(),
        })
    }

    /// Point the provider at another host (used against mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Convert ProviderRequest to the Messages API format
    ///
    /// System-role messages move into the top-level `system` field.
    fn to_message_request<'a>(&self, request: &'a ProviderRequest) -> MessageRequest<'a> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let system = request.system.clone().or_else(|| {
            let prompts: Vec<String> = request
                .messages
                .iter()
                .filter(|m| m.role == Role::System)
                .map(ProviderMessage::text)
                .collect();
            (!prompts.is_empty()).then(|| prompts.join("\n"))
        });

        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        MessageRequest {
            model,
            max_tokens: request.max_tokens,
            system,
            messages,
            tools: request.tools.as_deref(),
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let msg_request = self.to_message_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            "Sending request to Anthropic API ({} messages, model {})",
            msg_request.messages.len(),
            msg_request.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&msg_request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Anthropic API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        tracing::debug!("Received response: {:?}", message_response);

        let content = message_response
            .content
            .into_iter()
            .filter_map(ResponseBlock::into_content_block)
            .collect();

        Ok(ProviderResponse {
            id: message_response.id,
            model: message_response.model,
            content,
            stop_reason: message_response.stop_reason,
            provider: "anthropic".to_string(),
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Messages API types

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a [ContentBlock],
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    model: String,
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

impl ResponseBlock {
    fn into_content_block(self) -> Option<ContentBlock> {
        match self {
            ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            ResponseBlock::Unsupported => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::Message;

    #[test]
    fn test_system_messages_are_lifted() {
        let provider = AnthropicProvider::new("k".into()).unwrap();
        let request = ProviderRequest::new(vec![
            ProviderMessage::from(&Message::system("You are Claude.")),
            ProviderMessage::from(&Message::user("hi")),
        ])
        .with_model("claude-3-5-haiku-latest");

        let wire = provider.to_message_request(&request);
        assert_eq!(wire.system.as_deref(), Some("You are Claude."));
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");
    }

    #[test]
    fn test_request_serialization() {
        let provider = AnthropicProvider::new("k".into()).unwrap();
        let request = ProviderRequest::new(vec![ProviderMessage::from(&Message::user("hi"))])
            .with_model("claude-3-5-haiku-latest")
            .with_system("Be brief.");

        let json = serde_json::to_value(provider.to_message_request(&request)).unwrap();
        assert_eq!(json["system"], "Be brief.");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "hi");
        assert!(json.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_send_message_skips_unknown_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant")
            .match_header("anthropic-version", "2023-06-01")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "msg_1",
                    "type": "message",
                    "role": "assistant",
                    "model": "claude-3-5-haiku-latest",
                    "content": [
                        {"type": "thinking", "thinking": "hmm"},
                        {"type": "text", "text": "Bonjour"}
                    ],
                    "stop_reason": "end_turn"
                }"#,
            )
            .create_async()
            .await;

        let provider = AnthropicProvider::new("sk-ant".into())
            .unwrap()
            .with_base_url(server.url());
        let request = ProviderRequest::new(vec![ProviderMessage::from(&Message::user("hi"))]);

        let response = provider.send_message(&request).await.unwrap();
        assert_eq!(response.content.len(), 1);
        assert_eq!(response.text(), "Bonjour");
        mock.assert_async().await;
    }
}
