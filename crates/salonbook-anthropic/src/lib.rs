// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude conversation adapter for the Salonbook admin assistant.
//!
//! This crate implements [`ProviderAdapter`] for the Anthropic Messages API
//! as the last resort in the default conversation chain.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use salonbook_config::SalonbookConfig;
use salonbook_core::types::{ConversationReply, ConversationRequest};
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};
use secrecy::SecretString;
use tracing::info;

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest, ResponseContentBlock};

/// Environment variable consulted when `anthropic.api_key` is unset.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic Claude provider implementing the conversation capability.
///
/// API key resolution order: `anthropic.api_key` -> `ANTHROPIC_API_KEY`.
#[derive(Debug)]
pub struct AnthropicProvider {
    client: Option<AnthropicClient>,
    model: String,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let settings = &config.anthropic;
        let client = match salonbook_config::resolve_api_key(
            settings.api_key.as_deref(),
            API_KEY_ENV,
        ) {
            Some(key) => Some(AnthropicClient::new(
                &SecretString::from(key),
                &settings.api_version,
                &settings.base_url,
                Duration::from_secs(settings.timeout_secs),
            )?),
            None => None,
        };

        info!(
            model = settings.model,
            configured = client.is_some(),
            "Anthropic provider initialized"
        );

        Ok(Self {
            client,
            model: settings.model.clone(),
        })
    }

    /// Converts a [`ConversationRequest`] to an Anthropic [`MessageRequest`].
    ///
    /// The Messages API requires the first message to come from the user, so
    /// any leading assistant messages in the history window are dropped.
    fn to_message_request(&self, request: &ConversationRequest) -> MessageRequest {
        let messages = request
            .messages
            .iter()
            .skip_while(|m| m.role == salonbook_core::Role::Assistant)
            .map(|m| ApiMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        MessageRequest {
            model: self.model.clone(),
            messages,
            system: (!request.system_prompt.is_empty()).then(|| request.system_prompt.clone()),
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        // We avoid consuming tokens on health checks.
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("API key not configured".into()),
        })
    }
}

#[async_trait]
impl ProviderAdapter<ConversationRequest, ConversationReply> for AnthropicProvider {
    fn capability(&self) -> Capability {
        Capability::Conversation
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, request: ConversationRequest) -> Result<ConversationReply, ProviderFailure> {
        let client = self.client.as_ref().ok_or_else(ProviderFailure::missing_key)?;
        let response = client
            .complete_message(&self.to_message_request(&request))
            .await?;

        // Extract text content from response blocks.
        let text = response
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();

        if text.is_empty() {
            return Err(ProviderFailure::malformed(format!(
                "response contained no text (stop_reason: {})",
                response.stop_reason.as_deref().unwrap_or("none")
            )));
        }

        Ok(ConversationReply {
            text: text.to_string(),
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::Role;
    use salonbook_core::types::PromptMessage;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> AnthropicProvider {
        let mut config = SalonbookConfig::default();
        config.anthropic.base_url = base_url.to_string();
        config.anthropic.api_key = Some("sk-ant-test".into());
        AnthropicProvider::new(&config).unwrap()
    }

    fn prompt(role: Role, content: &str) -> PromptMessage {
        PromptMessage {
            role,
            content: content.into(),
        }
    }

    #[test]
    fn leading_assistant_messages_are_dropped() {
        let provider = provider("http://localhost");
        let request = ConversationRequest {
            system_prompt: "sys".into(),
            messages: vec![
                prompt(Role::Assistant, "Welcome back"),
                prompt(Role::User, "cancel booking b-7"),
            ],
            max_tokens: 100,
        };
        let api = provider.to_message_request(&request);
        assert_eq!(api.messages.len(), 1);
        assert_eq!(api.messages[0].role, "user");
        assert_eq!(api.system.as_deref(), Some("sys"));
    }

    #[tokio::test]
    async fn joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-3-5-haiku-latest",
                "system": "sys",
                "max_tokens": 300
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "model": "claude-3-5-haiku-latest",
                "content": [{"type": "text", "text": "Done, "}, {"type": "text", "text": "cancelled."}],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server.uri())
            .invoke(ConversationRequest {
                system_prompt: "sys".into(),
                messages: vec![prompt(Role::User, "cancel b-7")],
                max_tokens: 300,
            })
            .await
            .unwrap();
        assert_eq!(reply.text, "Done, cancelled.");
    }

    #[tokio::test]
    async fn empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_2",
                "model": "claude-3-5-haiku-latest",
                "content": [],
                "stop_reason": "max_tokens"
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .invoke(ConversationRequest {
                system_prompt: String::new(),
                messages: vec![prompt(Role::User, "hi")],
                max_tokens: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, salonbook_core::FailureKind::MalformedResponse);
        assert!(err.message.contains("max_tokens"));
    }

    #[tokio::test]
    async fn without_key_reports_missing_key() {
        let provider = AnthropicProvider {
            client: None,
            model: "claude-3-5-haiku-latest".into(),
        };
        let err = provider
            .invoke(ConversationRequest {
                system_prompt: String::new(),
                messages: vec![],
                max_tokens: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ProviderFailure::missing_key());
    }
}
