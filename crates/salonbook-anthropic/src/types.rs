// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API request/response types.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-3-5-haiku-latest").
    pub model: String,

    /// Conversation messages, alternating user/assistant.
    pub messages: Vec<ApiMessage>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// A single message in the Anthropic conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    pub content: String,
}

// --- Response types ---

/// A non-streaming response from the Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ResponseContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// A content block in a response. Only text is requested; anything else is
/// ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_blocks_are_tolerated() {
        let json = r#"{
            "id": "msg_1",
            "model": "claude-3-5-haiku-latest",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Hello"}
            ],
            "stop_reason": "end_turn"
        }"#;
        let resp: MessageResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.content[0], ResponseContentBlock::Other));
        assert!(matches!(&resp.content[1], ResponseContentBlock::Text { text } if text == "Hello"));
    }

    #[test]
    fn system_is_omitted_when_absent() {
        let req = MessageRequest {
            model: "m".into(),
            messages: vec![],
            system: None,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
    }
}
