// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter replaying scripted outcomes.
//!
//! One `ScriptedProvider` serves a single capability. Outcomes are popped
//! from a FIFO queue per call; once the queue is empty the `otherwise`
//! outcome repeats. Every request is recorded as text for assertions.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use salonbook_core::types::{
    AudioClip, ConversationReply, ConversationRequest, ExtractionReply, Transcript,
};
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};

type Outcome = Result<String, ProviderFailure>;

/// A provider with pre-configured outcomes.
///
/// For extraction providers a successful outcome is a JSON object
/// `{"intent": "...", "entities": {...}}`.
pub struct ScriptedProvider {
    name: String,
    capability: Capability,
    script: Mutex<VecDeque<Outcome>>,
    otherwise: Outcome,
    configured: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl std::fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedProvider")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl ScriptedProvider {
    fn new(name: &str, capability: Capability, otherwise: Outcome) -> Self {
        Self {
            name: name.to_string(),
            capability,
            script: Mutex::new(VecDeque::new()),
            otherwise,
            configured: true,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A conversation provider that answers plain chat once unscripted.
    pub fn conversation(name: &str) -> Self {
        Self::new(
            name,
            Capability::Conversation,
            Ok(r#"{"intent":"CHAT","entities":{},"response":"How can I help?"}"#.to_string()),
        )
    }

    /// A transcription provider returning an empty transcript once
    /// unscripted, which is a malformed-response failure.
    pub fn transcription(name: &str) -> Self {
        Self::new(
            name,
            Capability::Transcription,
            Err(ProviderFailure::malformed("transcription was empty")),
        )
    }

    /// An extraction provider recognizing nothing once unscripted.
    pub fn extraction(name: &str) -> Self {
        Self::new(name, Capability::EntityExtraction, Ok("{}".to_string()))
    }

    /// Queues a successful outcome.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queues a failure.
    pub fn fail(self, failure: ProviderFailure) -> Self {
        self.push(Err(failure))
    }

    /// Every call beyond the script fails with `failure`.
    pub fn always_fail(mut self, failure: ProviderFailure) -> Self {
        self.otherwise = Err(failure);
        self
    }

    /// Behaves like an adapter built without an API key.
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self.otherwise = Err(ProviderFailure::missing_key());
        self
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, outcome: Outcome) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Number of times the provider was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Text of every request, in call order. Conversation requests are
    /// recorded as their last message.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    async fn next(&self, request: String) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| self.otherwise.clone())
    }
}

#[async_trait]
impl PluginAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(if self.configured {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("API key not configured".into())
        })
    }
}

#[async_trait]
impl ProviderAdapter<ConversationRequest, ConversationReply> for ScriptedProvider {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn invoke(&self, request: ConversationRequest) -> Result<ConversationReply, ProviderFailure> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.next(last).await.map(|text| ConversationReply {
            text,
            model: format!("{}-scripted", self.name),
        })
    }
}

#[async_trait]
impl ProviderAdapter<AudioClip, Transcript> for ScriptedProvider {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn invoke(&self, clip: AudioClip) -> Result<Transcript, ProviderFailure> {
        let described = format!("{} ({} bytes)", clip.content_type, clip.data.len());
        self.next(described).await.map(|text| Transcript {
            text,
            confidence: Some(1.0),
        })
    }
}

#[async_trait]
impl ProviderAdapter<String, ExtractionReply> for ScriptedProvider {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn invoke(&self, text: String) -> Result<ExtractionReply, ProviderFailure> {
        let raw = self.next(text).await?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ProviderFailure::malformed(format!("scripted reply is not JSON: {e}")))?;
        let entities: BTreeMap<String, String> = value
            .get("entities")
            .and_then(|e| e.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        let intent = value.get("intent").and_then(|i| i.as_str()).map(String::from);
        Ok(ExtractionReply {
            confidence: if intent.is_some() { 0.9 } else { 0.0 },
            intent,
            entities,
        })
    }
}
