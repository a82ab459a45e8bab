// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use salonbook_core::{SalonError, SessionId};

use crate::session::ConversationSession;

/// Where conversation sessions live between turns.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<ConversationSession>, SalonError>;

    async fn save(&self, session: &ConversationSession) -> Result<(), SalonError>;

    async fn remove(&self, id: &SessionId) -> Result<(), SalonError>;

    async fn count(&self) -> Result<usize, SalonError>;
}

/// Process-lifetime session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, ConversationSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<ConversationSession>, SalonError> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), SalonError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SalonError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn count(&self) -> Result<usize, SalonError> {
        Ok(self.sessions.len())
    }
}
