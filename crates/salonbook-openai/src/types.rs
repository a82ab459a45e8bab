// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions and audio transcription wire types.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A message in the chat-completions format. Role is `system`, `user` or
/// `assistant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// --- Response types ---

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Absent for refusals and tool calls.
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `POST /audio/transcriptions` with `response_format=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
}
