// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by adapters, the assistant and the gateway.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Session used when a caller does not supply a conversation id.
    pub fn default_session() -> Self {
        SessionId("default".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

/// What a natural-language provider is able to do.
///
/// Each capability has its own fallback chain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Conversation,
    Transcription,
    EntityExtraction,
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message exchanged in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// --- Provider request/response types ---

/// A message in the prompt sent to a conversation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

/// A request to a conversation (chat-completion) provider.
///
/// `messages` is ordered oldest-first and ends with the current user turn.
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub system_prompt: String,
    pub messages: Vec<PromptMessage>,
    pub max_tokens: u32,
}

/// Text produced by a conversation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationReply {
    pub text: String,
    pub model: String,
}

/// An uploaded audio recording to transcribe.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Bytes,
    /// MIME type as sent by the client (e.g. `audio/webm`).
    pub content_type: String,
}

impl AudioClip {
    /// File extension matching the content type, for multipart uploads.
    pub fn file_extension(&self) -> &'static str {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match essence {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            _ => "webm",
        }
    }
}

/// Text produced by a transcription provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Intent and entities produced by an entity-extraction provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionReply {
    /// Provider-native intent name, if one was recognized.
    pub intent: Option<String>,
    pub confidence: f32,
    pub entities: BTreeMap<String, String>,
}

// --- Database collaborator types ---

/// Fields required to create an employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
}

/// A persisted employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
    pub active: bool,
    pub created_at: String,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Builds a range, swapping the bounds if they are reversed.
    pub fn between(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }
}

/// Result of a revenue query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub range: DateRange,
    pub total: f64,
    pub bookings: usize,
}

/// A booking's stylist after a reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAssignment {
    pub booking_id: String,
    /// `None` when no other stylist was available.
    pub stylist_name: Option<String>,
}

/// Result of reassigning one employee's bookings for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignOutcome {
    pub count: usize,
    pub assignments: Vec<BookingAssignment>,
}
