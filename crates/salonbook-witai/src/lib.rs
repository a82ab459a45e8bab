// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wit.ai entity-extraction adapter for the Salonbook admin assistant.
//!
//! Calls `GET /message?q=` and flattens Wit's intent and entity lists into an
//! [`ExtractionReply`]. Entities are keyed by their Wit role, so an app
//! trained with roles named after action fields (`employeeName`, `date`,
//! `bookingId`, ...) feeds the assistant directly.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use salonbook_config::SalonbookConfig;
use salonbook_core::types::ExtractionReply;
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable consulted when `witai.token` is unset.
pub const TOKEN_ENV: &str = "WIT_AI_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Wit rejects queries longer than this many characters.
const MAX_QUERY_CHARS: usize = 280;

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    intents: Vec<WitIntent>,
    #[serde(default)]
    entities: HashMap<String, Vec<WitEntity>>,
}

#[derive(Debug, Deserialize)]
struct WitIntent {
    name: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct WitEntity {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    confidence: f32,
}

impl WitEntity {
    fn text(&self) -> Option<String> {
        let text = match &self.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => self.body.clone()?,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Wit.ai provider implementing the entity-extraction capability.
pub struct WitAiProvider {
    client: reqwest::Client,
    token: Option<SecretString>,
    base_url: String,
    api_version: String,
    min_confidence: f32,
}

impl std::fmt::Debug for WitAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WitAiProvider")
            .field("configured", &self.token.is_some())
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("min_confidence", &self.min_confidence)
            .finish_non_exhaustive()
    }
}

impl WitAiProvider {
    /// Token resolution order: `witai.token` -> `WIT_AI_TOKEN`.
    pub fn new(config: &SalonbookConfig) -> Result<Self, SalonError> {
        let settings = &config.witai;
        let token = salonbook_config::resolve_api_key(settings.token.as_deref(), TOKEN_ENV)
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SalonError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(
            api_version = settings.api_version,
            configured = token.is_some(),
            "Wit.ai extraction provider initialized"
        );

        Ok(Self {
            client,
            token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            min_confidence: settings.min_confidence,
        })
    }

    fn to_reply(&self, response: MessageResponse) -> ExtractionReply {
        let top = response
            .intents
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let (intent, confidence) = match top {
            Some(i) if i.confidence >= self.min_confidence => (Some(i.name), i.confidence),
            Some(i) => (None, i.confidence),
            None => (None, 0.0),
        };

        let mut entities = BTreeMap::new();
        for (key, found) in response.entities {
            // Keys look like `wit$datetime:date` or `employee:employeeName`.
            let fallback = key.rsplit(':').next().unwrap_or(&key).to_string();
            let best = found
                .into_iter()
                .filter(|e| e.confidence >= self.min_confidence)
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
            if let Some(entity) = best {
                let field = entity.role.clone().unwrap_or(fallback);
                if let Some(text) = entity.text() {
                    entities.insert(field, text);
                }
            }
        }

        ExtractionReply {
            intent,
            confidence,
            entities,
        }
    }
}

#[async_trait]
impl PluginAdapter for WitAiProvider {
    fn name(&self) -> &str {
        "witai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(match self.token {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("API key not configured".into()),
        })
    }
}

#[async_trait]
impl ProviderAdapter<String, ExtractionReply> for WitAiProvider {
    fn capability(&self) -> Capability {
        Capability::EntityExtraction
    }

    fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    async fn invoke(&self, text: String) -> Result<ExtractionReply, ProviderFailure> {
        let token = self.token.as_ref().ok_or_else(ProviderFailure::missing_key)?;
        let query: String = text.chars().take(MAX_QUERY_CHARS).collect();

        let response = self
            .client
            .get(format!("{}/message", self.base_url))
            .bearer_auth(token.expose_secret())
            .query(&[("v", self.api_version.as_str()), ("q", query.as_str())])
            .send()
            .await
            .map_err(|e| ProviderFailure::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, "wit.ai response received");
        let body = response
            .text()
            .await
            .map_err(|e| ProviderFailure::transient(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ProviderFailure::from_status(status.as_u16(), &body));
        }

        let parsed: MessageResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderFailure::malformed(format!("failed to parse API response: {e}")))?;
        Ok(self.to_reply(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::FailureKind;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> WitAiProvider {
        let mut config = SalonbookConfig::default();
        config.witai.base_url = base_url.to_string();
        config.witai.token = Some("wit-token".into());
        WitAiProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn flattens_intent_and_roles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/message"))
            .and(query_param("v", "20240304"))
            .and(query_param("q", "move Priya's appointments today to Anita"))
            .and(header("authorization", "Bearer wit-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "move Priya's appointments today to Anita",
                "intents": [
                    {"id": "1", "name": "reassign_appointments", "confidence": 0.93},
                    {"id": "2", "name": "get_revenue", "confidence": 0.04}
                ],
                "entities": {
                    "employee:employeeName": [
                        {"role": "employeeName", "body": "Priya", "value": "Priya", "confidence": 0.91}
                    ],
                    "employee:toEmployeeName": [
                        {"role": "toEmployeeName", "body": "Anita", "value": "Anita", "confidence": 0.88}
                    ],
                    "wit$datetime:date": [
                        {"role": "date", "body": "today", "value": "2026-10-15T00:00:00.000+05:30", "confidence": 0.99}
                    ]
                },
                "traits": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server.uri())
            .invoke("move Priya's appointments today to Anita".into())
            .await
            .unwrap();
        assert_eq!(reply.intent.as_deref(), Some("reassign_appointments"));
        assert_eq!(reply.entities["employeeName"], "Priya");
        assert_eq!(reply.entities["toEmployeeName"], "Anita");
        assert_eq!(reply.entities["date"], "2026-10-15T00:00:00.000+05:30");
    }

    #[test]
    fn low_confidence_intent_is_dropped() {
        let provider = provider("http://localhost");
        let reply = provider.to_reply(MessageResponse {
            intents: vec![WitIntent {
                name: "cancel_booking".into(),
                confidence: 0.3,
            }],
            entities: HashMap::new(),
        });
        assert_eq!(reply.intent, None);
        assert!((reply.confidence - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn numeric_values_are_rendered_and_role_falls_back_to_key() {
        let provider = provider("http://localhost");
        let mut entities = HashMap::new();
        entities.insert(
            "booking:bookingId".to_string(),
            vec![WitEntity {
                role: None,
                body: Some("4512".into()),
                value: Some(serde_json::json!(4512)),
                confidence: 0.9,
            }],
        );
        let reply = provider.to_reply(MessageResponse {
            intents: vec![],
            entities,
        });
        assert_eq!(reply.entities["bookingId"], "4512");
    }

    #[tokio::test]
    async fn long_queries_are_truncated() {
        let server = MockServer::start().await;
        let long = "a".repeat(400);
        Mock::given(method("GET"))
            .and(query_param("q", "a".repeat(MAX_QUERY_CHARS).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "intents": [], "entities": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server.uri()).invoke(long).await.unwrap();
        assert_eq!(reply.intent, None);
    }

    #[tokio::test]
    async fn rate_limited_is_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "Too many requests", "code": "rate-limit"
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).invoke("hi".into()).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn without_token_reports_missing_key() {
        let mut provider = provider("http://localhost");
        provider.token = None;
        assert!(!provider.is_configured());
        assert_eq!(
            provider.invoke("hi".into()).await.unwrap_err(),
            ProviderFailure::missing_key()
        );
    }
}
