// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fallback over the providers of one capability.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use salonbook_core::{Capability, ProviderAdapter, ProviderFailure};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::availability::AvailabilityStore;

/// One provider's contribution to a fallback run that did not produce a
/// result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptFailure {
    pub provider: String,
    pub failure: ProviderFailure,
    /// `true` when the provider was already flagged unavailable and was not
    /// called; `failure` is then the error that flagged it.
    pub skipped: bool,
}

/// A successful fallback run.
#[derive(Debug, Clone)]
pub struct Routed<T> {
    /// Name of the provider that produced `payload`.
    pub provider: String,
    pub payload: T,
    /// Providers tried or skipped before the winner, in chain order.
    pub attempts: Vec<AttemptFailure>,
}

/// Every provider in a chain was unavailable or failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackExhausted {
    pub capability: Capability,
    /// One entry per registered provider, in chain order.
    pub failures: Vec<AttemptFailure>,
}

impl fmt::Display for FallbackExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no {} providers are configured", self.capability);
        }
        write!(f, "all {} providers failed: ", self.capability)?;
        for (i, attempt) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", attempt.provider, attempt.failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for FallbackExhausted {}

/// Tries providers in registration order until one succeeds.
///
/// Providers flagged unavailable in the shared [`AvailabilityStore`] are
/// skipped without being called. The store is updated after every attempt.
pub struct FallbackChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    capability: Capability,
    adapters: Vec<Arc<dyn ProviderAdapter<Req, Resp>>>,
    availability: Arc<dyn AvailabilityStore>,
    call_timeout: Option<Duration>,
}

impl<Req, Resp> FallbackChain<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    pub fn new(capability: Capability, availability: Arc<dyn AvailabilityStore>) -> Self {
        Self {
            capability,
            adapters: Vec::new(),
            availability,
            call_timeout: None,
        }
    }

    /// Caps the wall-clock time of each provider call. Hitting the cap counts
    /// as a transient failure.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Appends an adapter to the end of the chain.
    ///
    /// An adapter without credentials is flagged unavailable immediately so
    /// that it is never called.
    pub async fn register(&mut self, adapter: Arc<dyn ProviderAdapter<Req, Resp>>) {
        if adapter.capability() != self.capability {
            warn!(
                provider = adapter.name(),
                expected = %self.capability,
                actual = %adapter.capability(),
                "adapter registered under a different capability"
            );
        }
        if !adapter.is_configured() {
            self.availability
                .mark_unavailable(self.capability, adapter.name(), ProviderFailure::missing_key())
                .await;
        }
        self.adapters.push(adapter);
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Provider names in chain order.
    pub fn providers(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Runs `request` through the chain.
    pub async fn run(&self, request: Req) -> Result<Routed<Resp>, FallbackExhausted> {
        let mut failures = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let name = adapter.name();

            if !self.availability.is_available(self.capability, name).await {
                let failure = self
                    .availability
                    .last_error(self.capability, name)
                    .await
                    .unwrap_or_else(|| ProviderFailure::auth("provider unavailable"));
                debug!(provider = name, capability = %self.capability, "skipping unavailable provider");
                failures.push(AttemptFailure {
                    provider: name.to_string(),
                    failure,
                    skipped: true,
                });
                continue;
            }

            match self.call(adapter.as_ref(), request.clone()).await {
                Ok(payload) => {
                    self.availability.record_success(self.capability, name).await;
                    if !failures.is_empty() {
                        info!(
                            provider = name,
                            capability = %self.capability,
                            fallbacks = failures.len(),
                            "served by fallback provider"
                        );
                    }
                    return Ok(Routed {
                        provider: name.to_string(),
                        payload,
                        attempts: failures,
                    });
                }
                Err(failure) => {
                    warn!(
                        provider = name,
                        capability = %self.capability,
                        kind = %failure.kind,
                        error = %failure.message,
                        "provider call failed"
                    );
                    self.availability
                        .record_failure(self.capability, name, &failure)
                        .await;
                    failures.push(AttemptFailure {
                        provider: name.to_string(),
                        failure,
                        skipped: false,
                    });
                }
            }
        }

        Err(FallbackExhausted {
            capability: self.capability,
            failures,
        })
    }

    async fn call(
        &self,
        adapter: &dyn ProviderAdapter<Req, Resp>,
        request: Req,
    ) -> Result<Resp, ProviderFailure> {
        let Some(limit) = self.call_timeout else {
            return adapter.invoke(request).await;
        };
        match tokio::time::timeout(limit, adapter.invoke(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderFailure::transient(format!(
                "no response within {}s",
                limit.as_secs_f32()
            ))),
        }
    }
}

impl<Req, Resp> fmt::Debug for FallbackChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("capability", &self.capability)
            .field(
                "providers",
                &self.adapters.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
