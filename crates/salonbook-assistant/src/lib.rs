// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational admin assistant for the Salonbook dashboard.
//!
//! Turns a stream of admin messages into at most one database operation per
//! completed action:
//! - [`parser`] pulls an intent and entities out of a provider reply
//! - [`session`] tracks history and the half-collected pending action
//! - [`executor`] runs a completed action against the [`SalonStore`](salonbook_core::SalonStore)
//! - [`assistant`] drives a turn end to end through the fallback chains

pub mod action;
pub mod assistant;
pub mod executor;
pub mod keywords;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod store;

pub use action::{ActionKind, Entities, TurnAction};
pub use assistant::{AdminAssistant, TurnResponse, VoiceTurnError, VoiceTurnResponse};
pub use executor::{ActionExecutor, ActionResult, Execution};
pub use keywords::KeywordExtractor;
pub use parser::{ParsedResponse, parse_response};
pub use session::{ConversationSession, PendingAction, SessionState};
pub use store::{InMemorySessionStore, SessionStore};
