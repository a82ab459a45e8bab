// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use salonbook_core::{ProviderFailure, SalonError};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::types::{GenerateContentRequest, GenerateContentResponse};

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client. The key travels in the `x-goog-api-key` header so it
    /// never shows up in request URLs or logs.
    pub fn new(api_key: &SecretString, base_url: &str, timeout: Duration) -> Result<Self, SalonError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| SalonError::Config(format!("invalid Gemini API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SalonError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `POST {base}/models/{model}:generateContent`.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderFailure> {
        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderFailure::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, model, "gemini response received");
        let body = response
            .text()
            .await
            .map_err(|e| ProviderFailure::transient(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderFailure::malformed(format!("failed to parse API response: {e}")))
    }
}

/// Gemini reports a bad key as `400 INVALID_ARGUMENT` with reason
/// `API_KEY_INVALID`, so that case is lifted to an auth error before the
/// generic status mapping.
fn classify_error(status: u16, body: &str) -> ProviderFailure {
    if status == 400 && body.contains("API_KEY_INVALID") {
        return ProviderFailure::auth("HTTP 400: API key not valid");
    }
    ProviderFailure::from_status(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, GenerationConfig};
    use salonbook_core::FailureKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            &SecretString::from("gm-key".to_string()),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::text(Some("user"), "hi")],
            generation_config: GenerationConfig {
                max_output_tokens: 64,
                temperature: 0.2,
            },
        }
    }

    #[tokio::test]
    async fn posts_to_model_endpoint_with_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "gm-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = test_client(&server.uri())
            .generate_content("gemini-1.5-flash", &test_request())
            .await
            .unwrap();
        assert_eq!(resp.text().as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn resource_exhausted_is_quota() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .generate_content("gemini-1.5-flash", &test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::QuotaExceeded);
    }

    #[test]
    fn invalid_key_400_is_auth() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(classify_error(400, body).kind, FailureKind::AuthError);
    }

    #[test]
    fn other_400_is_malformed() {
        assert_eq!(
            classify_error(400, "model not found").kind,
            FailureKind::MalformedResponse
        );
    }
}
