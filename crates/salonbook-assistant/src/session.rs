// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation state: message history and the pending action.
//!
//! A session is either awaiting an intent or collecting the missing fields
//! of one pending action. Collected fields persist across turns until the
//! action executes or is abandoned for a different one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use salonbook_core::types::{ChatMessage, Role};
use salonbook_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, Entities};

/// Where a session is in the collect-then-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    AwaitingIntent,
    Collecting,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::AwaitingIntent => write!(f, "awaiting-intent"),
            SessionState::Collecting => write!(f, "collecting"),
        }
    }
}

/// An action whose required fields are not all known yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub entities: Entities,
    pub updated_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(kind: ActionKind, entities: Entities) -> Self {
        Self {
            kind,
            entities,
            updated_at: Utc::now(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.kind.missing_fields(&self.entities)
    }
}

/// Merges `new` into `base`. Only values that are present and non-empty
/// overwrite; everything already collected is kept.
pub fn merge_into(base: &mut Entities, new: &Entities) {
    for (field, value) in new {
        let value = value.trim();
        if !field.is_empty() && !value.is_empty() {
            base.insert(field.clone(), value.to_string());
        }
    }
}

/// State of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: SessionId,
    pub messages: Vec<ChatMessage>,
    pub pending: Option<PendingAction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            pending: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.pending {
            Some(_) => SessionState::Collecting,
            None => SessionState::AwaitingIntent,
        }
    }

    pub fn append_message(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, text));
        self.updated_at = Utc::now();
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent_messages(&self, limit: usize) -> &[ChatMessage] {
        let skip = self.messages.len().saturating_sub(limit);
        &self.messages[skip..]
    }

    /// Starts collecting `kind`, replacing any pending action.
    pub fn begin(&mut self, kind: ActionKind, entities: Entities) {
        let mut collected = Entities::new();
        merge_into(&mut collected, &entities);
        self.pending = Some(PendingAction::new(kind, collected));
    }

    /// Merges `new` into the pending action's entities and returns the
    /// merged map. Without a pending action this returns `new` cleaned of
    /// empty values and changes nothing.
    pub fn merge_entities(&mut self, new: &Entities) -> Entities {
        match self.pending.as_mut() {
            Some(pending) => {
                merge_into(&mut pending.entities, new);
                pending.updated_at = Utc::now();
                pending.entities.clone()
            }
            None => {
                let mut merged = Entities::new();
                merge_into(&mut merged, new);
                merged
            }
        }
    }

    /// Whether the pending action is of `kind` and has every required field.
    pub fn is_complete(&self, kind: ActionKind) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.kind == kind && p.missing_fields().is_empty())
    }

    /// Clears the pending action, returning it.
    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Drops the pending action if it has been idle longer than `ttl`.
    /// Returns whether it was dropped.
    pub fn expire_pending(&mut self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let expired = self.pending.as_ref().is_some_and(|p| {
            now.signed_duration_since(p.updated_at)
                .to_std()
                .is_ok_and(|idle| idle > ttl)
        });
        if expired {
            self.pending = None;
        }
        expired
    }
}
