// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini conversation adapter for the Salonbook admin assistant.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use salonbook_config::SalonbookConfig;
use salonbook_core::types::{ConversationReply, ConversationRequest};
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure, Role,
    SalonError,
};
use secrecy::SecretString;
use tracing::info;

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Environment variable consulted when `gemini.api_key` is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini provider implementing the conversation capability.
///
/// API key resolution order: `gemini.api_key` -> `GEMINI_API_KEY`.
#[derive(Debug)]
pub struct GeminiProvider {
    client: Option<GeminiClient>,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let client = match salonbook_config::resolve_api_key(
            config.gemini.api_key.as_deref(),
            API_KEY_ENV,
        ) {
            Some(key) => Some(GeminiClient::new(
                &SecretString::from(key),
                &config.gemini.base_url,
                Duration::from_secs(config.gemini.timeout_secs),
            )?),
            None => None,
        };

        info!(
            model = config.gemini.model,
            configured = client.is_some(),
            "Gemini provider initialized"
        );

        Ok(Self {
            client,
            model: config.gemini.model.clone(),
        })
    }

    fn to_generate_request(request: &ConversationRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Content::text(Some(role), m.content.clone())
            })
            .collect();

        GenerateContentRequest {
            system_instruction: (!request.system_prompt.is_empty())
                .then(|| Content::text(None, request.system_prompt.clone())),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: 0.2,
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("API key not configured".into()),
        })
    }
}

#[async_trait]
impl ProviderAdapter<ConversationRequest, ConversationReply> for GeminiProvider {
    fn capability(&self) -> Capability {
        Capability::Conversation
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, request: ConversationRequest) -> Result<ConversationReply, ProviderFailure> {
        let client = self.client.as_ref().ok_or_else(ProviderFailure::missing_key)?;
        let response = client
            .generate_content(&self.model, &Self::to_generate_request(&request))
            .await?;

        let text = response.text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".into());
            ProviderFailure::malformed(format!("response contained no text ({reason})"))
        })?;

        Ok(ConversationReply {
            text,
            model: response.model_version.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::FailureKind;
    use salonbook_core::types::PromptMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> GeminiProvider {
        let mut config = SalonbookConfig::default();
        config.gemini.base_url = base_url.to_string();
        config.gemini.api_key = Some("gm-key".into());
        GeminiProvider::new(&config).unwrap()
    }

    fn request() -> ConversationRequest {
        ConversationRequest {
            system_prompt: "sys".into(),
            messages: vec![
                PromptMessage {
                    role: Role::User,
                    content: "hi".into(),
                },
                PromptMessage {
                    role: Role::Assistant,
                    content: "hello".into(),
                },
            ],
            max_tokens: 200,
        }
    }

    #[tokio::test]
    async fn maps_assistant_role_to_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ],
                "generationConfig": {"maxOutputTokens": 200}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Sure!"}]}}],
                "modelVersion": "gemini-1.5-flash-002"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server.uri()).invoke(request()).await.unwrap();
        assert_eq!(reply.text, "Sure!");
        assert_eq!(reply.model, "gemini-1.5-flash-002");
    }

    #[tokio::test]
    async fn blocked_response_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).invoke(request()).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
        assert!(err.message.contains("SAFETY"));
    }

    #[tokio::test]
    async fn without_key_reports_missing_key() {
        let provider = GeminiProvider {
            client: None,
            model: "gemini-1.5-flash".into(),
        };
        assert!(!provider.is_configured());
        assert_eq!(
            provider.invoke(request()).await.unwrap_err(),
            ProviderFailure::missing_key()
        );
    }
}
