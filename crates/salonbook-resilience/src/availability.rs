// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider availability tracking.
//!
//! A provider that fails with quota exhaustion or bad credentials is taken out
//! of rotation and stays out until [`AvailabilityStore::reset`] (in practice,
//! process restart). Transient and malformed failures are recorded but leave
//! the provider available.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use salonbook_core::{Capability, ProviderFailure};
use serde::Serialize;
use tracing::{info, warn};

/// Point-in-time view of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub capability: Capability,
    pub available: bool,
    pub last_error: Option<ProviderFailure>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub successes: u64,
    pub failures: u64,
}

impl ProviderStatus {
    fn new(capability: Capability, name: &str) -> Self {
        Self {
            name: name.to_string(),
            capability,
            available: true,
            last_error: None,
            last_success_at: None,
            successes: 0,
            failures: 0,
        }
    }
}

/// Storage for provider availability flags.
///
/// Keyed by capability and provider name. Implementations must be shareable
/// across sessions; the orchestrator consults the same store for every turn.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Providers never seen before are available.
    async fn is_available(&self, capability: Capability, name: &str) -> bool;

    async fn last_error(&self, capability: Capability, name: &str) -> Option<ProviderFailure>;

    async fn record_success(&self, capability: Capability, name: &str);

    /// Records a failed call, flagging the provider unavailable when the
    /// failure kind calls for it.
    async fn record_failure(&self, capability: Capability, name: &str, failure: &ProviderFailure);

    /// Flags a provider unavailable regardless of failure kind.
    async fn mark_unavailable(&self, capability: Capability, name: &str, failure: ProviderFailure);

    /// All known providers, ordered by capability then name.
    async fn snapshot(&self) -> Vec<ProviderStatus>;

    /// Forgets every flag and counter, except that providers without
    /// credentials stay unavailable.
    async fn reset(&self);
}

/// Process-local availability store.
#[derive(Debug, Default)]
pub struct InMemoryAvailability {
    entries: DashMap<(Capability, String), ProviderStatus>,
}

impl InMemoryAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, capability: Capability, name: &str, f: impl FnOnce(&mut ProviderStatus)) {
        let mut entry = self
            .entries
            .entry((capability, name.to_string()))
            .or_insert_with(|| ProviderStatus::new(capability, name));
        f(entry.value_mut());
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailability {
    async fn is_available(&self, capability: Capability, name: &str) -> bool {
        self.entries
            .get(&(capability, name.to_string()))
            .is_none_or(|s| s.available)
    }

    async fn last_error(&self, capability: Capability, name: &str) -> Option<ProviderFailure> {
        self.entries
            .get(&(capability, name.to_string()))
            .and_then(|s| s.last_error.clone())
    }

    async fn record_success(&self, capability: Capability, name: &str) {
        self.update(capability, name, |s| {
            s.successes += 1;
            s.last_success_at = Some(Utc::now());
        });
    }

    async fn record_failure(&self, capability: Capability, name: &str, failure: &ProviderFailure) {
        let disable = failure.kind.disables_provider();
        self.update(capability, name, |s| {
            s.failures += 1;
            s.last_error = Some(failure.clone());
            if disable {
                s.available = false;
            }
        });
        if disable {
            warn!(
                provider = name,
                capability = %capability,
                kind = %failure.kind,
                "provider flagged unavailable for the rest of the process"
            );
        }
    }

    async fn mark_unavailable(&self, capability: Capability, name: &str, failure: ProviderFailure) {
        info!(
            provider = name,
            capability = %capability,
            reason = %failure,
            "provider unavailable"
        );
        self.update(capability, name, |s| {
            s.available = false;
            s.last_error = Some(failure);
        });
    }

    async fn snapshot(&self) -> Vec<ProviderStatus> {
        let mut all: Vec<ProviderStatus> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| (a.capability, &a.name).cmp(&(b.capability, &b.name)));
        all
    }

    async fn reset(&self) {
        let missing_key = ProviderFailure::missing_key();
        self.entries
            .retain(|_, s| s.last_error.as_ref() == Some(&missing_key));
        for mut entry in self.entries.iter_mut() {
            let (capability, name) = entry.key().clone();
            *entry.value_mut() = ProviderStatus {
                available: false,
                last_error: Some(missing_key.clone()),
                ..ProviderStatus::new(capability, &name)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONV: Capability = Capability::Conversation;

    #[tokio::test]
    async fn unknown_provider_is_available() {
        let store = InMemoryAvailability::new();
        assert!(store.is_available(CONV, "openai").await);
        assert!(store.last_error(CONV, "openai").await.is_none());
    }

    #[tokio::test]
    async fn quota_failure_disables() {
        let store = InMemoryAvailability::new();
        store
            .record_failure(CONV, "openai", &ProviderFailure::quota("out of credit"))
            .await;
        assert!(!store.is_available(CONV, "openai").await);
        assert_eq!(
            store.last_error(CONV, "openai").await,
            Some(ProviderFailure::quota("out of credit"))
        );
    }

    #[tokio::test]
    async fn transient_failure_keeps_provider_available() {
        let store = InMemoryAvailability::new();
        store
            .record_failure(CONV, "gemini", &ProviderFailure::transient("timeout"))
            .await;
        assert!(store.is_available(CONV, "gemini").await);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot[0].failures, 1);
    }

    #[tokio::test]
    async fn success_does_not_reenable() {
        let store = InMemoryAvailability::new();
        store
            .record_failure(CONV, "openai", &ProviderFailure::auth("bad key"))
            .await;
        store.record_success(CONV, "openai").await;
        assert!(!store.is_available(CONV, "openai").await);
    }

    #[tokio::test]
    async fn capabilities_are_tracked_separately() {
        let store = InMemoryAvailability::new();
        store
            .mark_unavailable(
                Capability::Transcription,
                "whisper",
                ProviderFailure::missing_key(),
            )
            .await;
        assert!(!store.is_available(Capability::Transcription, "whisper").await);
        assert!(store.is_available(CONV, "whisper").await);
    }

    #[tokio::test]
    async fn reset_clears_flags() {
        let store = InMemoryAvailability::new();
        store
            .record_failure(CONV, "openai", &ProviderFailure::quota("x"))
            .await;
        store.reset().await;
        assert!(store.is_available(CONV, "openai").await);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn reset_keeps_providers_without_credentials_unavailable() {
        let store = InMemoryAvailability::new();
        store
            .mark_unavailable(CONV, "anthropic", ProviderFailure::missing_key())
            .await;
        store
            .record_failure(CONV, "openai", &ProviderFailure::auth("invalid api key"))
            .await;
        store.reset().await;

        assert!(store.is_available(CONV, "openai").await);
        assert!(!store.is_available(CONV, "anthropic").await);
        assert_eq!(
            store.last_error(CONV, "anthropic").await,
            Some(ProviderFailure::missing_key())
        );
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_is_sorted() {
        let store = InMemoryAvailability::new();
        store.record_success(Capability::Transcription, "whisper").await;
        store.record_success(CONV, "openai").await;
        store.record_success(CONV, "gemini").await;
        let names: Vec<_> = store
            .snapshot()
            .await
            .into_iter()
            .map(|s| (s.capability, s.name))
            .collect();
        assert_eq!(
            names,
            vec![
                (CONV, "gemini".to_string()),
                (CONV, "openai".to_string()),
                (Capability::Transcription, "whisper".to_string()),
            ]
        );
    }
}
