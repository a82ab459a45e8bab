// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One fallback chain per capability, sharing an availability store.

use std::sync::Arc;
use std::time::Duration;

use salonbook_core::types::{
    AudioClip, ConversationReply, ConversationRequest, ExtractionReply, Transcript,
};
use salonbook_core::{
    Capability, ConversationAdapter, ExtractionAdapter, TranscriptionAdapter,
};

use crate::availability::{AvailabilityStore, InMemoryAvailability, ProviderStatus};
use crate::chain::{FallbackChain, FallbackExhausted, Routed};

/// Routes every natural-language call through its capability's chain.
pub struct FallbackOrchestrator {
    conversation: FallbackChain<ConversationRequest, ConversationReply>,
    transcription: FallbackChain<AudioClip, Transcript>,
    extraction: FallbackChain<String, ExtractionReply>,
    availability: Arc<dyn AvailabilityStore>,
}

impl FallbackOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub async fn converse(
        &self,
        request: ConversationRequest,
    ) -> Result<Routed<ConversationReply>, FallbackExhausted> {
        self.conversation.run(request).await
    }

    pub async fn transcribe(&self, clip: AudioClip) -> Result<Routed<Transcript>, FallbackExhausted> {
        self.transcription.run(clip).await
    }

    pub async fn extract(&self, text: &str) -> Result<Routed<ExtractionReply>, FallbackExhausted> {
        self.extraction.run(text.to_string()).await
    }

    /// Whether any extraction providers are registered.
    pub fn has_extraction(&self) -> bool {
        !self.extraction.is_empty()
    }

    /// Registered provider names per capability, in chain order.
    pub fn chains(&self) -> Vec<(Capability, Vec<String>)> {
        vec![
            (Capability::Conversation, self.conversation.providers()),
            (Capability::Transcription, self.transcription.providers()),
            (Capability::EntityExtraction, self.extraction.providers()),
        ]
    }

    /// Status of every registered provider, in chain order. Providers that
    /// have never been called are reported available with no counters.
    pub async fn status(&self) -> Vec<ProviderStatus> {
        let known = self.availability.snapshot().await;
        let mut out = Vec::new();
        for (capability, names) in self.chains() {
            for name in names {
                let status = known
                    .iter()
                    .find(|s| s.capability == capability && s.name == name)
                    .cloned()
                    .unwrap_or_else(|| ProviderStatus {
                        name,
                        capability,
                        available: true,
                        last_error: None,
                        last_success_at: None,
                        successes: 0,
                        failures: 0,
                    });
                out.push(status);
            }
        }
        out
    }

    pub fn availability(&self) -> &Arc<dyn AvailabilityStore> {
        &self.availability
    }
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("conversation", &self.conversation)
            .field("transcription", &self.transcription)
            .field("extraction", &self.extraction)
            .finish_non_exhaustive()
    }
}

/// Collects adapters in priority order, then builds the orchestrator.
#[derive(Default)]
pub struct OrchestratorBuilder {
    conversation: Vec<Arc<ConversationAdapter>>,
    transcription: Vec<Arc<TranscriptionAdapter>>,
    extraction: Vec<Arc<ExtractionAdapter>>,
    availability: Option<Arc<dyn AvailabilityStore>>,
    transcription_timeout: Option<Duration>,
}

impl OrchestratorBuilder {
    pub fn conversation(mut self, adapter: Arc<ConversationAdapter>) -> Self {
        self.conversation.push(adapter);
        self
    }

    pub fn transcription(mut self, adapter: Arc<TranscriptionAdapter>) -> Self {
        self.transcription.push(adapter);
        self
    }

    pub fn extraction(mut self, adapter: Arc<ExtractionAdapter>) -> Self {
        self.extraction.push(adapter);
        self
    }

    /// Shares an existing store. Defaults to a fresh [`InMemoryAvailability`].
    pub fn availability(mut self, store: Arc<dyn AvailabilityStore>) -> Self {
        self.availability = Some(store);
        self
    }

    /// Wall-clock cap for a single transcription call.
    pub fn transcription_timeout(mut self, timeout: Duration) -> Self {
        self.transcription_timeout = Some(timeout);
        self
    }

    pub async fn build(self) -> FallbackOrchestrator {
        let availability = self
            .availability
            .unwrap_or_else(|| Arc::new(InMemoryAvailability::new()) as Arc<dyn AvailabilityStore>);

        let mut conversation = FallbackChain::new(Capability::Conversation, availability.clone());
        for adapter in self.conversation {
            conversation.register(adapter).await;
        }

        let mut transcription = FallbackChain::new(Capability::Transcription, availability.clone());
        if let Some(timeout) = self.transcription_timeout {
            transcription = transcription.with_call_timeout(timeout);
        }
        for adapter in self.transcription {
            transcription.register(adapter).await;
        }

        let mut extraction = FallbackChain::new(Capability::EntityExtraction, availability.clone());
        for adapter in self.extraction {
            extraction.register(adapter).await;
        }

        FallbackOrchestrator {
            conversation,
            transcription,
            extraction,
            availability,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use salonbook_core::{
        AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure, SalonError,
    };

    use super::*;

    struct FixedExtractor {
        configured: bool,
    }

    #[async_trait]
    impl PluginAdapter for FixedExtractor {
        fn name(&self) -> &str {
            "fixed"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }
        async fn health_check(&self) -> Result<HealthStatus, SalonError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl ProviderAdapter<String, ExtractionReply> for FixedExtractor {
        fn capability(&self) -> Capability {
            Capability::EntityExtraction
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        async fn invoke(&self, text: String) -> Result<ExtractionReply, ProviderFailure> {
            Ok(ExtractionReply {
                intent: Some(text),
                confidence: 1.0,
                entities: Default::default(),
            })
        }
    }

    #[tokio::test]
    async fn extraction_routes_through_chain() {
        let orchestrator = FallbackOrchestrator::builder()
            .extraction(Arc::new(FixedExtractor { configured: true }))
            .build()
            .await;
        assert!(orchestrator.has_extraction());
        let routed = orchestrator.extract("revenue").await.unwrap();
        assert_eq!(routed.provider, "fixed");
        assert_eq!(routed.payload.intent.as_deref(), Some("revenue"));
    }

    #[tokio::test]
    async fn empty_chains_are_exhausted() {
        let orchestrator = FallbackOrchestrator::builder().build().await;
        assert!(!orchestrator.has_extraction());
        let err = orchestrator.extract("x").await.unwrap_err();
        assert_eq!(err.capability, Capability::EntityExtraction);
    }

    #[tokio::test]
    async fn status_includes_uncalled_and_unconfigured_providers() {
        let orchestrator = FallbackOrchestrator::builder()
            .extraction(Arc::new(FixedExtractor { configured: false }))
            .build()
            .await;
        let status = orchestrator.status().await;
        assert_eq!(status.len(), 1);
        assert!(!status[0].available);
        assert_eq!(status[0].last_error, Some(ProviderFailure::missing_key()));
    }

    #[tokio::test]
    async fn shared_store_is_used() {
        let store: Arc<dyn AvailabilityStore> = Arc::new(InMemoryAvailability::new());
        let orchestrator = FallbackOrchestrator::builder()
            .availability(store.clone())
            .extraction(Arc::new(FixedExtractor { configured: true }))
            .build()
            .await;
        orchestrator.extract("x").await.unwrap();
        assert_eq!(store.snapshot().await[0].successes, 1);
    }
}
