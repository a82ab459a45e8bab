// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway API.
//!
//! Handles POST /api/chat, POST /api/voice, POST /api/transcribe,
//! GET /api/providers and GET /health.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use salonbook_assistant::{VoiceTurnError, VoiceTurnResponse};
use salonbook_core::types::AudioClip;
use salonbook_core::{SalonError, SessionId};
use salonbook_resilience::{AttemptFailure, FallbackExhausted, ProviderStatus};

use crate::server::GatewayState;

/// Content type assumed when an upload does not declare one.
const DEFAULT_AUDIO_TYPE: &str = "audio/webm";

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Conversation to continue. Defaults to the shared `default` session.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Query string for POST /api/voice.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceQuery {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response body for POST /api/transcribe.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
    pub provider: String,
}

/// Response body for GET /api/providers.
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Provider names per capability, in fallback order.
    pub chains: BTreeMap<String, Vec<String>>,
    pub providers: Vec<ProviderStatus>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error response for an exhausted fallback chain.
#[derive(Debug, Serialize)]
struct ExhaustedResponse<'a> {
    error: String,
    providers: &'a [AttemptFailure],
}

fn session_id(conversation_id: Option<String>) -> SessionId {
    conversation_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(SessionId)
        .unwrap_or_else(SessionId::default_session)
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn salon_error_response(err: &SalonError) -> Response {
    let status = match err {
        SalonError::MissingField { .. } | SalonError::InvalidField { .. } => StatusCode::BAD_REQUEST,
        SalonError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "turn failed");
    }
    error_response(status, err.to_string())
}

fn exhausted_response(exhausted: &FallbackExhausted) -> Response {
    tracing::warn!(error = %exhausted, "fallback chain exhausted");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ExhaustedResponse {
            error: exhausted.to_string(),
            providers: &exhausted.failures,
        }),
    )
        .into_response()
}

fn audio_clip(headers: &HeaderMap, body: Bytes) -> Result<AudioClip, Response> {
    if body.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "audio body is empty"));
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_AUDIO_TYPE)
        .to_string();
    Ok(AudioClip {
        data: body,
        content_type,
    })
}

/// POST /api/chat
///
/// Runs one conversation turn. Provider exhaustion is not an HTTP error:
/// the turn carries the "unavailable" reply.
pub async fn post_chat(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequest>,
) -> Response {
    let session = session_id(body.conversation_id);
    match state.assistant.handle_turn(&session, &body.message).await {
        Ok(turn) => (StatusCode::OK, Json(turn)).into_response(),
        Err(err) => salon_error_response(&err),
    }
}

/// POST /api/voice
///
/// Transcribes the raw audio body, then runs the transcript as a chat turn.
pub async fn post_voice(
    State(state): State<GatewayState>,
    Query(query): Query<VoiceQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let clip = match audio_clip(&headers, body) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    let session = session_id(query.conversation_id);
    match state.assistant.handle_voice_turn(&session, clip).await {
        Ok(turn) => (StatusCode::OK, Json::<VoiceTurnResponse>(turn)).into_response(),
        Err(VoiceTurnError::Transcription(exhausted)) => exhausted_response(&exhausted),
        Err(VoiceTurnError::Turn(err)) => salon_error_response(&err),
    }
}

/// POST /api/transcribe
pub async fn post_transcribe(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let clip = match audio_clip(&headers, body) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    match state.assistant.transcribe(clip).await {
        Ok(routed) => (
            StatusCode::OK,
            Json(TranscriptionResponse {
                text: routed.payload.text,
                provider: routed.provider,
            }),
        )
            .into_response(),
        Err(exhausted) => exhausted_response(&exhausted),
    }
}

/// GET /api/providers
pub async fn get_providers(State(state): State<GatewayState>) -> Json<ProvidersResponse> {
    let orchestrator = state.assistant.orchestrator();
    let chains = orchestrator
        .chains()
        .into_iter()
        .map(|(capability, names)| (capability.to_string(), names))
        .collect();
    Json(ProvidersResponse {
        chains,
        providers: orchestrator.status().await,
    })
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
