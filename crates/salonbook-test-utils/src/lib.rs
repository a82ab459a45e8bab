// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Salonbook integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`ScriptedProvider`] - Provider replaying scripted outcomes per call
//! - [`RecordingStore`] - Salon store recording every call, with injectable failures
//! - [`TestHarness`] - An [`AdminAssistant`](salonbook_assistant::AdminAssistant) wired from the above

pub mod harness;
pub mod recording_store;
pub mod scripted_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use recording_store::{RecordingStore, StoreCall};
pub use scripted_provider::ScriptedProvider;
