// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deepgram pre-recorded transcription adapter for the Salonbook admin
//! assistant.
//!
//! The audio body is posted as-is to `/v1/listen` with the client's content
//! type; Deepgram detects the container itself.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use salonbook_config::SalonbookConfig;
use salonbook_core::types::{AudioClip, Transcript};
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable consulted when `deepgram.api_key` is unset.
pub const API_KEY_ENV: &str = "DEEPGRAM_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Deepgram provider implementing the transcription capability.
pub struct DeepgramProvider {
    client: Option<reqwest::Client>,
    base_url: String,
    model: String,
    language: String,
}

impl std::fmt::Debug for DeepgramProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepgramProvider")
            .field("configured", &self.client.is_some())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl DeepgramProvider {
    /// API key resolution order: `deepgram.api_key` -> `DEEPGRAM_API_KEY`.
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let settings = &config.deepgram;
        let client = match salonbook_config::resolve_api_key(
            settings.api_key.as_deref(),
            API_KEY_ENV,
        ) {
            Some(key) => Some(build_client(&SecretString::from(key))?),
            None => None,
        };

        info!(
            model = settings.model,
            configured = client.is_some(),
            "Deepgram transcription provider initialized"
        );

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            language: settings.language.clone(),
        })
    }
}

fn build_client(api_key: &SecretString) -> Result<reqwest::Client, SalonError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Token {}", api_key.expose_secret()))
        .map_err(|e| SalonError::Config(format!("invalid Deepgram API key header value: {e}")))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SalonError::Provider {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

#[async_trait]
impl PluginAdapter for DeepgramProvider {
    fn name(&self) -> &str {
        "deepgram"
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
impl ProviderAdapter<AudioClip, Transcript> for DeepgramProvider {
    fn capability(&self) -> Capability {
        Capability::Transcription
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, clip: AudioClip) -> Result<Transcript, ProviderFailure> {
        let client = self.client.as_ref().ok_or_else(ProviderFailure::missing_key)?;

        let response = client
            .post(&self.base_url)
            .query(&[
                ("model", self.model.as_str()),
                ("language", self.language.as_str()),
                ("smart_format", "true"),
            ])
            .header(CONTENT_TYPE, clip.content_type.as_str())
            .body(clip.data)
            .send()
            .await
            .map_err(|e| ProviderFailure::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, "deepgram response received");
        let body = response
            .text()
            .await
            .map_err(|e| ProviderFailure::transient(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ProviderFailure::from_status(status.as_u16(), &body));
        }

        let parsed: ListenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderFailure::malformed(format!("failed to parse API response: {e}")))?;

        let best = parsed
            .results
            .channels
            .into_iter()
            .flat_map(|c| c.alternatives)
            .find(|a| !a.transcript.trim().is_empty())
            .ok_or_else(|| ProviderFailure::malformed("transcription was empty"))?;

        Ok(Transcript {
            text: best.transcript.trim().to_string(),
            confidence: best.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::FailureKind;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> DeepgramProvider {
        let mut config = SalonbookConfig::default();
        config.deepgram.base_url = format!("{}/v1/listen", server.uri());
        config.deepgram.api_key = Some("dg-key".into());
        DeepgramProvider::new(&config).unwrap()
    }

    fn clip() -> AudioClip {
        AudioClip {
            data: bytes::Bytes::from_static(b"OggS...."),
            content_type: "audio/ogg".into(),
        }
    }

    #[tokio::test]
    async fn posts_raw_audio_and_reads_first_alternative() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/listen"))
            .and(query_param("model", "nova-2"))
            .and(query_param("language", "en"))
            .and(header("authorization", "Token dg-key"))
            .and(header("content-type", "audio/ogg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "metadata": {"request_id": "r1"},
                "results": {"channels": [{"alternatives": [
                    {"transcript": "show revenue for today", "confidence": 0.97}
                ]}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transcript = provider(&server).invoke(clip()).await.unwrap();
        assert_eq!(transcript.text, "show revenue for today");
        assert_eq!(transcript.confidence, Some(0.97));

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, b"OggS....");
    }

    #[tokio::test]
    async fn silent_audio_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": {"channels": [{"alternatives": [{"transcript": "", "confidence": 0.0}]}]}
            })))
            .mount(&server)
            .await;

        let err = provider(&server).invoke(clip()).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn exhausted_credits_are_quota() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "err_code": "ASR_PAYMENT_REQUIRED",
                "err_msg": "Project does not have enough credits or an active billing plan."
            })))
            .mount(&server)
            .await;

        let err = provider(&server).invoke(clip()).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn bad_key_is_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("INVALID_AUTH"))
            .mount(&server)
            .await;

        let err = provider(&server).invoke(clip()).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::AuthError);
    }

    #[tokio::test]
    async fn without_key_reports_missing_key() {
        let provider = DeepgramProvider {
            client: None,
            base_url: "http://localhost".into(),
            model: "nova-2".into(),
            language: "en".into(),
        };
        assert!(!provider.is_configured());
        assert_eq!(
            provider.invoke(clip()).await.unwrap_err(),
            ProviderFailure::missing_key()
        );
    }

    #[test]
    fn debug_does_not_leak_key() {
        let mut config = SalonbookConfig::default();
        config.deepgram.api_key = Some("dg-secret".into());
        let provider = DeepgramProvider::new(&config).unwrap();
        assert!(!format!("{provider:?}").contains("dg-secret"));
    }
}
