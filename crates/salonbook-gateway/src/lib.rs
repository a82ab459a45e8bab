// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Salonbook admin assistant.
//!
//! Exposes the chat turn, voice turn and transcription endpoints the admin
//! dashboard calls, plus a provider availability snapshot and an
//! unauthenticated liveness probe.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, router, start_server};
