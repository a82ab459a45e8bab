// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI REST API.
//!
//! Provides [`OpenAiClient`] which handles authentication, request
//! construction and classification of every failure into a
//! [`ProviderFailure`]. There is no retry here: a failed call moves the
//! fallback chain on to the next provider.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use salonbook_core::types::AudioClip;
use salonbook_core::{ProviderFailure, SalonError};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ChatCompletionRequest, ChatCompletionResponse, TranscriptionResponse};

/// HTTP client for OpenAI API communication.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: SecretString, base_url: &str, timeout: Duration) -> Result<Self, SalonError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SalonError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `POST /chat/completions`.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderFailure> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(send_failure)?;
        read_json(response).await
    }

    /// `POST /audio/transcriptions` as a multipart upload.
    pub async fn transcribe(
        &self,
        clip: &AudioClip,
        model: &str,
    ) -> Result<TranscriptionResponse, ProviderFailure> {
        let file_name = format!("audio.{}", clip.file_extension());
        let part = Part::bytes(clip.data.to_vec()).file_name(file_name.clone());
        let part = match part.mime_str(&clip.content_type) {
            Ok(part) => part,
            // Unparseable content type: let the API sniff the file instead.
            Err(_) => Part::bytes(clip.data.to_vec()).file_name(file_name),
        };
        let form = Form::new()
            .part("file", part)
            .text("model", model.to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(send_failure)?;
        read_json(response).await
    }
}

fn send_failure(e: reqwest::Error) -> ProviderFailure {
    ProviderFailure::transient(format!("HTTP request failed: {e}"))
}

/// Classifies a response: non-2xx by status and body, 2xx by whether the
/// body decodes.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderFailure> {
    let status = response.status();
    debug!(status = %status, "openai response received");

    let body = response
        .text()
        .await
        .map_err(|e| ProviderFailure::transient(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(ProviderFailure::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderFailure::malformed(format!("failed to parse API response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use salonbook_core::FailureKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(
            SecretString::from("test-key".to_string()),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn test_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            max_tokens: 128,
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn chat_completion_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = test_client(&server.uri())
            .chat_completion(&test_request())
            .await
            .unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/", server.uri());
        assert!(test_client(&base).chat_completion(&test_request()).await.is_ok());
    }

    #[tokio::test]
    async fn insufficient_quota_is_quota_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"type": "insufficient_quota", "message": "You exceeded your current quota"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .chat_completion(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn invalid_key_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .chat_completion(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::AuthError);
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .chat_completion(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        let err = test_client("http://127.0.0.1:1")
            .chat_completion(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::TransientNetwork);
    }

    #[tokio::test]
    async fn transcription_uploads_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "hello"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let clip = AudioClip {
            data: bytes::Bytes::from_static(b"RIFF....WAVE"),
            content_type: "audio/wav".into(),
        };
        let resp = test_client(&server.uri())
            .transcribe(&clip, "whisper-1")
            .await
            .unwrap();
        assert_eq!(resp.text, "hello");

        let received = server.received_requests().await.unwrap();
        let content_type = received[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("filename=\"audio.wav\""));
        assert!(body.contains("whisper-1"));
    }

    #[test]
    fn debug_redacts_key() {
        let client = test_client("http://localhost");
        let debug = format!("{client:?}");
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
