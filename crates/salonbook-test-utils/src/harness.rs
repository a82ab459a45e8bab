// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete assistant stack with scripted
//! providers, an in-memory session store and either a [`RecordingStore`] or
//! a temp SQLite database. The clock is pinned to [`TestHarness::TODAY`] so
//! relative dates resolve deterministically.

use std::sync::Arc;

use chrono::NaiveDate;
use salonbook_assistant::{AdminAssistant, InMemorySessionStore, TurnResponse};
use salonbook_config::SalonbookConfig;
use salonbook_config::model::StorageConfig;
use salonbook_core::{
    ConversationAdapter, ExtractionAdapter, SalonError, SalonStore, SessionId,
    TranscriptionAdapter,
};
use salonbook_resilience::FallbackOrchestrator;
use salonbook_storage::SqliteStore;

use crate::recording_store::RecordingStore;

/// Builder for creating test environments with configurable options.
#[derive(Default)]
pub struct TestHarnessBuilder {
    conversation: Vec<Arc<ConversationAdapter>>,
    transcription: Vec<Arc<TranscriptionAdapter>>,
    extraction: Vec<Arc<ExtractionAdapter>>,
    config: SalonbookConfig,
    store: Option<Arc<RecordingStore>>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    /// Appends a conversation provider to the chain.
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

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: SalonbookConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a caller-owned recording store.
    pub fn with_store(mut self, store: Arc<RecordingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Backs the assistant with a real SQLite database in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SalonError> {
        let temp_dir = tempfile::TempDir::new().map_err(SalonError::storage)?;

        let (store, recording, sqlite) = if self.sqlite {
            let config = StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            };
            let sqlite = SqliteStore::open(&config).await?;
            (Arc::new(sqlite.clone()) as Arc<dyn SalonStore>, None, Some(sqlite))
        } else {
            let recording = self.store.unwrap_or_default();
            (recording.clone() as Arc<dyn SalonStore>, Some(recording), None)
        };

        let mut builder = FallbackOrchestrator::builder();
        for adapter in self.conversation {
            builder = builder.conversation(adapter);
        }
        for adapter in self.transcription {
            builder = builder.transcription(adapter);
        }
        for adapter in self.extraction {
            builder = builder.extraction(adapter);
        }
        let orchestrator = Arc::new(builder.build().await);

        let assistant = AdminAssistant::new(
            &self.config.assistant,
            orchestrator,
            store,
            Arc::new(InMemorySessionStore::new()),
        )
        .with_clock(|| TestHarness::TODAY);

        Ok(TestHarness {
            assistant: Arc::new(assistant),
            recording,
            sqlite,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired assistant for integration tests.
pub struct TestHarness {
    pub assistant: Arc<AdminAssistant>,
    /// Set unless the harness was built with SQLite.
    pub recording: Option<Arc<RecordingStore>>,
    pub sqlite: Option<SqliteStore>,
    pub config: SalonbookConfig,
    // Keeps the SQLite file alive for the harness lifetime.
    _temp_dir: tempfile::TempDir,
}

impl std::fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("assistant", &self.assistant)
            .field("sqlite", &self.sqlite.is_some())
            .finish_non_exhaustive()
    }
}

impl TestHarness {
    /// The pinned "today", a Thursday.
    pub const TODAY: NaiveDate = match NaiveDate::from_ymd_opt(2026, 10, 15) {
        Some(day) => day,
        None => NaiveDate::MIN,
    };

    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Sends a message on the given conversation.
    pub async fn send(&self, session: &str, text: &str) -> Result<TurnResponse, SalonError> {
        self.assistant
            .handle_turn(&SessionId(session.to_string()), text)
            .await
    }

    /// Calls made against the recording store, empty for SQLite harnesses.
    pub fn store_calls(&self) -> Vec<crate::StoreCall> {
        self.recording.as_ref().map(|r| r.calls()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScriptedProvider, StoreCall};
    use salonbook_assistant::ActionKind;

    #[tokio::test]
    async fn scripted_conversation_drives_store() {
        let provider = Arc::new(ScriptedProvider::conversation("openai").reply(
            r#"{"intent":"CANCEL_BOOKING","entities":{"bookingId":"b-9"},"response":"Cancelling."}"#,
        ));
        let harness = TestHarness::builder()
            .conversation(provider.clone())
            .build()
            .await
            .unwrap();

        let turn = harness.send("s1", "cancel booking b-9").await.unwrap();
        assert_eq!(turn.action.intent, ActionKind::CancelBooking);
        assert_eq!(harness.store_calls(), [StoreCall::Cancel("b-9".into())]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn sqlite_harness_opens_database() {
        let harness = TestHarness::builder()
            .conversation(Arc::new(ScriptedProvider::conversation("openai")))
            .with_sqlite()
            .build()
            .await
            .unwrap();
        assert!(harness.sqlite.is_some());
        assert!(harness.store_calls().is_empty());

        let turn = harness.send("s1", "hello").await.unwrap();
        assert_eq!(turn.action.intent, ActionKind::Chat);
    }
}
