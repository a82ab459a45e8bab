// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all adapters must implement.

use async_trait::async_trait;

use crate::error::SalonError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Salonbook adapters.
///
/// Provides identity and health check capabilities shared by provider
/// adapters and the database collaborator.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the stable name of this adapter instance (e.g. `openai`).
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, SalonError>;
}
