// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider adapters for the Salonbook admin assistant.
//!
//! [`OpenAiChatProvider`] serves the conversation capability through the
//! chat-completions API. [`WhisperProvider`] serves transcription through
//! `/audio/transcriptions`. Both share the same API key.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use salonbook_config::SalonbookConfig;
use salonbook_config::model::OpenAiConfig;
use salonbook_core::types::{AudioClip, ConversationReply, ConversationRequest, Transcript};
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};
use secrecy::SecretString;
use tracing::info;

use crate::client::OpenAiClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

/// Environment variable consulted when `openai.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

fn build_client(config: &OpenAiConfig) -> Result<Option<OpenAiClient>, SalonError> {
    let Some(api_key) = salonbook_config::resolve_api_key(config.api_key.as_deref(), API_KEY_ENV)
    else {
        return Ok(None);
    };
    OpenAiClient::new(
        SecretString::from(api_key),
        &config.base_url,
        Duration::from_secs(config.timeout_secs),
    )
    .map(Some)
}

/// OpenAI chat-completions provider implementing the conversation capability.
///
/// API key resolution order: `openai.api_key` -> `OPENAI_API_KEY`. Without a
/// key the provider is still constructed but reports itself unconfigured.
#[derive(Debug)]
pub struct OpenAiChatProvider {
    client: Option<OpenAiClient>,
    model: String,
}

impl OpenAiChatProvider {
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let client = build_client(&config.openai)?;
        info!(
            model = config.openai.chat_model,
            configured = client.is_some(),
            "OpenAI chat provider initialized"
        );
        Ok(Self {
            client,
            model: config.openai.chat_model.clone(),
        })
    }

    fn to_completion_request(&self, request: &ConversationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".into(),
                content: request.system_prompt.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: 0.2,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        // No API call: health checks must not spend quota.
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("API key not configured".into()),
        })
    }
}

#[async_trait]
impl ProviderAdapter<ConversationRequest, ConversationReply> for OpenAiChatProvider {
    fn capability(&self) -> Capability {
        Capability::Conversation
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, request: ConversationRequest) -> Result<ConversationReply, ProviderFailure> {
        let client = self.client.as_ref().ok_or_else(ProviderFailure::missing_key)?;
        let response = client
            .chat_completion(&self.to_completion_request(&request))
            .await?;

        let text = response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderFailure::malformed("response contained no message content"))?;

        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };
        Ok(ConversationReply { text, model })
    }
}

/// OpenAI Whisper provider implementing the transcription capability.
#[derive(Debug)]
pub struct WhisperProvider {
    client: Option<OpenAiClient>,
    model: String,
}

impl WhisperProvider {
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let client = build_client(&config.openai)?;
        info!(
            model = config.openai.transcription_model,
            configured = client.is_some(),
            "Whisper transcription provider initialized"
        );
        Ok(Self {
            client,
            model: config.openai.transcription_model.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for WhisperProvider {
    fn name(&self) -> &str {
        "whisper"
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
impl ProviderAdapter<AudioClip, Transcript> for WhisperProvider {
    fn capability(&self) -> Capability {
        Capability::Transcription
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, clip: AudioClip) -> Result<Transcript, ProviderFailure> {
        let client = self.client.as_ref().ok_or_else(ProviderFailure::missing_key)?;
        let response = client.transcribe(&clip, &self.model).await?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(ProviderFailure::malformed("transcription was empty"));
        }
        Ok(Transcript {
            text: text.to_string(),
            confidence: None,
        })
    }
}
