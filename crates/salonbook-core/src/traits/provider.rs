// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for external natural-language services.

use async_trait::async_trait;

use crate::failure::ProviderFailure;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AudioClip, Capability, ConversationReply, ConversationRequest, ExtractionReply, Transcript,
};

/// Uniform wrapper around one external NL service.
///
/// `invoke` must never panic or leak a provider-specific error: every
/// failure is converted into a classified [`ProviderFailure`] so that the
/// fallback orchestrator can move on to the next provider.
#[async_trait]
pub trait ProviderAdapter<Req, Resp>: PluginAdapter
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// The capability this adapter serves.
    fn capability(&self) -> Capability;

    /// Whether credentials were supplied. Unconfigured adapters are flagged
    /// unavailable when they are registered with a fallback chain.
    fn is_configured(&self) -> bool {
        true
    }

    /// Calls the provider once.
    async fn invoke(&self, request: Req) -> Result<Resp, ProviderFailure>;
}

/// Chat-completion providers.
pub type ConversationAdapter = dyn ProviderAdapter<ConversationRequest, ConversationReply>;

/// Speech-to-text providers.
pub type TranscriptionAdapter = dyn ProviderAdapter<AudioClip, Transcript>;

/// Intent/entity-extraction providers. The request is the user's text.
pub type ExtractionAdapter = dyn ProviderAdapter<String, ExtractionReply>;
