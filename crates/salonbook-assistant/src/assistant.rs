// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn driver: one user message in, one assistant reply out.
//!
//! A turn loads the session, asks the conversation chain to interpret the
//! message (falling back to the extraction chain), folds the result into
//! the pending action, executes it once complete, and saves the session.
//! Turns for the same session are serialized; different sessions run
//! concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use salonbook_config::model::AssistantConfig;
use salonbook_core::types::{AudioClip, Transcript};
use salonbook_core::{Role, SalonError, SalonStore, SessionId};
use salonbook_resilience::{FallbackExhausted, FallbackOrchestrator, Routed};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::action::{ActionKind, TurnAction, field_label, follow_up_question};
use crate::executor::{ActionExecutor, ActionResult};
use crate::parser::{ParsedResponse, parse_response};
use crate::prompt::PromptBuilder;
use crate::session::{ConversationSession, PendingAction, SessionState};
use crate::store::SessionStore;

/// Reply used for chat turns when the provider gave no text.
const CAPABILITIES_REPLY: &str = "I can add employees, look up revenue, reassign appointments, \
     and assign or cancel bookings. What would you like to do?";

/// Prefix of the reply when every provider failed.
pub const UNAVAILABLE_REPLY: &str =
    "Sorry, the assistant is unavailable right now. Please try again in a little while.";

/// The reply to one chat turn, as sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub conversation_id: String,
    pub message: String,
    pub action: TurnAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_result: Option<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_follow_up: Option<bool>,
    /// Provider that interpreted the message, if any did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub state: SessionState,
}

/// A chat turn driven by an audio clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTurnResponse {
    #[serde(flatten)]
    pub turn: TurnResponse,
    pub transcript: String,
    pub transcribed_by: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VoiceTurnError {
    #[error(transparent)]
    Transcription(#[from] FallbackExhausted),
    #[error(transparent)]
    Turn(#[from] SalonError),
}

enum Interpretation {
    Parsed {
        parsed: ParsedResponse,
        provider: String,
    },
    Unavailable(Vec<FallbackExhausted>),
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Drives conversation turns for the admin assistant.
pub struct AdminAssistant {
    orchestrator: Arc<FallbackOrchestrator>,
    executor: ActionExecutor,
    sessions: Arc<dyn SessionStore>,
    prompts: PromptBuilder,
    pending_ttl: Option<Duration>,
    locks: DashMap<SessionId, Arc<Mutex<()>>>,
    today: Clock,
}

impl std::fmt::Debug for AdminAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAssistant")
            .field("orchestrator", &self.orchestrator)
            .field("executor", &self.executor)
            .field("pending_ttl", &self.pending_ttl)
            .finish_non_exhaustive()
    }
}

impl AdminAssistant {
    pub fn new(
        config: &AssistantConfig,
        orchestrator: Arc<FallbackOrchestrator>,
        store: Arc<dyn SalonStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            orchestrator,
            executor: ActionExecutor::new(store),
            sessions,
            prompts: PromptBuilder::new(config),
            pending_ttl: config.pending_ttl_secs.map(Duration::from_secs),
            locks: DashMap::new(),
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replaces the clock used to resolve relative dates.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn orchestrator(&self) -> &Arc<FallbackOrchestrator> {
        &self.orchestrator
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn session_lock(&self, id: &SessionId) -> Arc<Mutex<()>> {
        self.locks.entry(id.clone()).or_default().clone()
    }

    /// Handles one text message. Errors only when the session store fails.
    #[tracing::instrument(skip_all, fields(session = %session_id))]
    pub async fn handle_turn(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<TurnResponse, SalonError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SalonError::MissingField {
                action: ActionKind::Chat.to_string(),
                field: "message".to_string(),
            });
        }

        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self
            .sessions
            .load(session_id)
            .await?
            .unwrap_or_else(|| ConversationSession::new(session_id.clone()));

        if let Some(ttl) = self.pending_ttl {
            if session.expire_pending(ttl, Utc::now()) {
                debug!("pending action expired");
            }
        }

        session.append_message(Role::User, text);
        let today = (self.today)();

        let mut response = match self.interpret(&session, text, today).await {
            Interpretation::Parsed { parsed, provider } => {
                let mut response = self.apply(&mut session, parsed, today).await;
                response.provider = Some(provider);
                response
            }
            Interpretation::Unavailable(exhausted) => {
                unavailable(&exhausted, session.pending.as_ref())
            }
        };
        response.conversation_id = session_id.to_string();
        response.state = session.state();

        session.append_message(Role::Assistant, response.message.clone());
        self.sessions.save(&session).await?;
        Ok(response)
    }

    /// Transcribes a clip through the transcription chain.
    pub async fn transcribe(&self, clip: AudioClip) -> Result<Routed<Transcript>, FallbackExhausted> {
        self.orchestrator.transcribe(clip).await
    }

    /// Transcribes a clip, then handles the transcript as a chat turn.
    pub async fn handle_voice_turn(
        &self,
        session_id: &SessionId,
        clip: AudioClip,
    ) -> Result<VoiceTurnResponse, VoiceTurnError> {
        let routed = self.transcribe(clip).await?;
        let turn = self.handle_turn(session_id, &routed.payload.text).await?;
        Ok(VoiceTurnResponse {
            turn,
            transcript: routed.payload.text,
            transcribed_by: routed.provider,
        })
    }

    async fn interpret(
        &self,
        session: &ConversationSession,
        text: &str,
        today: NaiveDate,
    ) -> Interpretation {
        let request = self.prompts.build(session, today);
        let conversation = match self.orchestrator.converse(request).await {
            Ok(routed) => {
                return Interpretation::Parsed {
                    parsed: parse_response(&routed.payload.text),
                    provider: routed.provider,
                };
            }
            Err(exhausted) => exhausted,
        };

        if !self.orchestrator.has_extraction() {
            warn!(error = %conversation, "assistant unavailable");
            return Interpretation::Unavailable(vec![conversation]);
        }

        match self.orchestrator.extract(text).await {
            Ok(routed) => {
                info!(
                    provider = routed.provider,
                    "conversation providers exhausted, interpreted by extraction"
                );
                Interpretation::Parsed {
                    parsed: ParsedResponse::from_extraction(&routed.payload),
                    provider: routed.provider,
                }
            }
            Err(extraction) => {
                warn!(conversation = %conversation, extraction = %extraction, "assistant unavailable");
                Interpretation::Unavailable(vec![conversation, extraction])
            }
        }
    }

    /// Folds a parsed reply into the session and executes a completed action.
    async fn apply(
        &self,
        session: &mut ConversationSession,
        parsed: ParsedResponse,
        today: NaiveDate,
    ) -> TurnResponse {
        let ParsedResponse {
            kind,
            entities,
            reply,
            follow_up_questions,
            requires_follow_up,
        } = parsed;

        let pending_kind = session.pending.as_ref().map(|p| p.kind);
        let kind = match (pending_kind, kind) {
            (Some(pending), ActionKind::Chat) => {
                session.merge_entities(&entities);
                pending
            }
            (Some(pending), k) if pending == k => {
                session.merge_entities(&entities);
                pending
            }
            (Some(pending), k) => {
                info!(abandoned = %pending, started = %k, "pending action replaced");
                session.begin(k, entities);
                k
            }
            (None, ActionKind::Chat) => {
                let message = if reply.is_empty() {
                    CAPABILITIES_REPLY.to_string()
                } else {
                    reply
                };
                return TurnResponse {
                    message,
                    action: TurnAction::new(ActionKind::Chat, entities),
                    follow_up_questions: (!follow_up_questions.is_empty())
                        .then_some(follow_up_questions),
                    requires_follow_up: requires_follow_up.then_some(true),
                    ..TurnResponse::blank()
                };
            }
            (None, k) => {
                session.begin(k, entities);
                k
            }
        };

        if session.is_complete(kind) {
            let Some(pending) = session.take_pending() else {
                return TurnResponse::blank();
            };
            let execution = self.executor.execute(kind, &pending.entities, today).await;
            return TurnResponse {
                message: execution.message,
                action: TurnAction::new(kind, pending.entities),
                action_result: Some(execution.result),
                ..TurnResponse::blank()
            };
        }

        let (missing, collected) = session
            .pending
            .as_ref()
            .map(|p| (p.missing_fields(), p.entities.clone()))
            .unwrap_or_default();
        let questions = if follow_up_questions.is_empty() {
            missing.iter().map(|f| follow_up_question(kind, f)).collect()
        } else {
            follow_up_questions
        };
        let message = if reply.is_empty() {
            format!("To {}, I still need the {}.", kind.describe(), join_labels(&missing))
        } else {
            reply
        };
        TurnResponse {
            message,
            action: TurnAction::new(kind, collected),
            follow_up_questions: Some(questions),
            requires_follow_up: Some(true),
            ..TurnResponse::blank()
        }
    }
}

impl TurnResponse {
    fn blank() -> Self {
        Self {
            conversation_id: String::new(),
            message: String::new(),
            action: TurnAction::chat(),
            action_result: None,
            follow_up_questions: None,
            requires_follow_up: None,
            provider: None,
            state: SessionState::AwaitingIntent,
        }
    }
}

fn join_labels(fields: &[&str]) -> String {
    let labels: Vec<&str> = fields.iter().map(|f| field_label(f)).collect();
    match labels.as_slice() {
        [] => String::new(),
        [one] => (*one).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// The turn reply when every chain is exhausted. A pending action is reported
/// unchanged so the client keeps its collected fields.
fn unavailable(exhausted: &[FallbackExhausted], pending: Option<&PendingAction>) -> TurnResponse {
    let details: Vec<String> = exhausted.iter().map(ToString::to_string).collect();
    let providers: Vec<serde_json::Value> = exhausted
        .iter()
        .flat_map(|e| {
            e.failures.iter().map(move |a| {
                json!({
                    "provider": a.provider,
                    "capability": e.capability,
                    "kind": a.failure.kind,
                    "message": a.failure.message,
                    "skipped": a.skipped,
                })
            })
        })
        .collect();

    TurnResponse {
        message: format!("{UNAVAILABLE_REPLY} ({})", details.join("; ")),
        action: pending
            .map(|p| TurnAction::new(p.kind, p.entities.clone()))
            .unwrap_or_default(),
        action_result: Some(ActionResult {
            success: false,
            kind: ActionKind::Chat,
            data: json!({ "providers": providers }),
        }),
        ..TurnResponse::blank()
    }
}
