// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the fallback chains from the configured provider orders.

use std::sync::Arc;
use std::time::Duration;

use salonbook_anthropic::AnthropicProvider;
use salonbook_assistant::KeywordExtractor;
use salonbook_config::SalonbookConfig;
use salonbook_core::{
    ConversationAdapter, ExtractionAdapter, SalonError, TranscriptionAdapter,
};
use salonbook_deepgram::DeepgramProvider;
use salonbook_gemini::GeminiProvider;
use salonbook_openai::{OpenAiChatProvider, WhisperProvider};
use salonbook_resilience::{FallbackOrchestrator, OrchestratorBuilder};
use salonbook_witai::WitAiProvider;
use tracing::{info, warn};

fn conversation_adapter(
    name: &str,
    config: &SalonbookConfig,
) -> Result<Option<Arc<ConversationAdapter>>, SalonError> {
    let adapter: Arc<ConversationAdapter> = match name {
        "openai" => Arc::new(OpenAiChatProvider::new(config)?),
        "gemini" => Arc::new(GeminiProvider::new(config)?),
        "anthropic" => Arc::new(AnthropicProvider::new(config)?),
        _ => return Ok(None),
    };
    Ok(Some(adapter))
}

fn transcription_adapter(
    name: &str,
    config: &SalonbookConfig,
) -> Result<Option<Arc<TranscriptionAdapter>>, SalonError> {
    let adapter: Arc<TranscriptionAdapter> = match name {
        "whisper" => Arc::new(WhisperProvider::new(config)?),
        "deepgram" => Arc::new(DeepgramProvider::new(config)?),
        _ => return Ok(None),
    };
    Ok(Some(adapter))
}

fn extraction_adapter(
    name: &str,
    config: &SalonbookConfig,
) -> Result<Option<Arc<ExtractionAdapter>>, SalonError> {
    let adapter: Arc<ExtractionAdapter> = match name {
        "witai" => Arc::new(WitAiProvider::new(config)?),
        "keywords" => Arc::new(KeywordExtractor::new()),
        _ => return Ok(None),
    };
    Ok(Some(adapter))
}

/// Registers every configured provider in its configured order.
///
/// Unknown names are rejected by config validation; any that slip through
/// are logged and skipped.
pub async fn build_orchestrator(config: &SalonbookConfig) -> Result<FallbackOrchestrator, SalonError> {
    let order = &config.providers;
    let mut builder: OrchestratorBuilder = FallbackOrchestrator::builder()
        .transcription_timeout(Duration::from_secs(config.transcription.max_duration_secs));

    for name in &order.conversation_order {
        match conversation_adapter(name, config)? {
            Some(adapter) => builder = builder.conversation(adapter),
            None => warn!(provider = name, "unknown conversation provider skipped"),
        }
    }
    for name in &order.transcription_order {
        match transcription_adapter(name, config)? {
            Some(adapter) => builder = builder.transcription(adapter),
            None => warn!(provider = name, "unknown transcription provider skipped"),
        }
    }
    for name in &order.extraction_order {
        match extraction_adapter(name, config)? {
            Some(adapter) => builder = builder.extraction(adapter),
            None => warn!(provider = name, "unknown extraction provider skipped"),
        }
    }

    let orchestrator = builder.build().await;
    for (capability, names) in orchestrator.chains() {
        info!(%capability, chain = ?names, "fallback chain ready");
    }
    Ok(orchestrator)
}

/// Runs the `salonbook providers` command.
pub async fn run_providers(config: &SalonbookConfig) -> Result<(), SalonError> {
    let orchestrator = build_orchestrator(config).await?;
    let status = orchestrator.status().await;

    for (capability, names) in orchestrator.chains() {
        println!("{capability}:");
        if names.is_empty() {
            println!("  (none)");
        }
        for (position, name) in names.iter().enumerate() {
            let ready = status
                .iter()
                .find(|s| s.capability == capability && &s.name == name)
                .is_some_and(|s| s.available);
            let label = if ready { "ready" } else { "no credentials" };
            println!("  {}. {name:<10} {label}", position + 1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::Capability;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn chains_follow_configured_order() {
        let mut config = SalonbookConfig::default();
        config.providers.conversation_order = vec!["anthropic".into(), "openai".into()];
        config.providers.extraction_order = vec!["witai".into(), "keywords".into()];

        let orchestrator = build_orchestrator(&config).await.unwrap();
        let chains = orchestrator.chains();
        assert_eq!(chains[0], (Capability::Conversation, names(&["anthropic", "openai"])));
        assert_eq!(chains[1], (Capability::Transcription, names(&["whisper", "deepgram"])));
        assert_eq!(chains[2], (Capability::EntityExtraction, names(&["witai", "keywords"])));
    }

    #[tokio::test]
    async fn keyword_extractor_is_always_ready() {
        let mut config = SalonbookConfig::default();
        config.providers.extraction_order = vec!["keywords".into()];
        let orchestrator = build_orchestrator(&config).await.unwrap();
        let status = orchestrator.status().await;
        let keywords = status.iter().find(|s| s.name == "keywords").unwrap();
        assert!(keywords.available);
    }

    #[tokio::test]
    async fn unknown_names_are_skipped() {
        let mut config = SalonbookConfig::default();
        config.providers.conversation_order = vec!["openai".into(), "mystery".into()];
        let orchestrator = build_orchestrator(&config).await.unwrap();
        assert_eq!(orchestrator.chains()[0].1, ["openai"]);
    }
}
