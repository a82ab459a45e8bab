// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles request construction,
//! authentication and failure classification.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use salonbook_core::{ProviderFailure, SalonError};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// HTTP client for Anthropic API communication.
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    /// * `base_url` - Full Messages endpoint URL
    pub fn new(
        api_key: &SecretString,
        api_version: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, SalonError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| SalonError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version)
                .map_err(|e| SalonError::Config(format!("invalid API version header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

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
            base_url: base_url.to_string(),
        })
    }

    /// Sends a non-streaming request and returns the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ProviderFailure> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderFailure::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, "completion response received");

        let body = response
            .text()
            .await
            .map_err(|e| ProviderFailure::transient(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let mut failure = ProviderFailure::from_status(status.as_u16(), &body);
            if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                failure.message = format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                );
            }
            return Err(failure);
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderFailure::malformed(format!("failed to parse API response: {e}")))
    }
}
