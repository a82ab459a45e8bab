// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider fallback for the Salonbook admin assistant.
//!
//! Each capability (conversation, transcription, entity extraction) has an
//! ordered [`FallbackChain`] of adapters. Providers that run out of quota or
//! reject their credentials are flagged in a shared [`AvailabilityStore`]
//! and skipped on every later call.

pub mod availability;
pub mod chain;
pub mod orchestrator;

pub use availability::{AvailabilityStore, InMemoryAvailability, ProviderStatus};
pub use chain::{AttemptFailure, FallbackChain, FallbackExhausted, Routed};
pub use orchestrator::{FallbackOrchestrator, OrchestratorBuilder};
