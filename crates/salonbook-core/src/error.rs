// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Salonbook admin assistant.
//!
//! Provider-level failures are not represented here; they are
//! values of [`ProviderFailure`](crate::failure::ProviderFailure) so the
//! fallback orchestrator can classify and absorb them.

use thiserror::Error;

/// The primary error type used across all Salonbook crates.
#[derive(Debug, Error)]
pub enum SalonError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, migration, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single-document or batched write was rejected by the database.
    #[error("database write failed: {0}")]
    DatabaseWrite(String),

    /// A read or aggregate query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// The targeted record does not exist.
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },

    /// Provider client construction or transport errors outside an adapter call.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An action was executed without one of its required entities.
    #[error("missing required field `{field}` for {action}")]
    MissingField { action: String, field: String },

    /// An entity value could not be interpreted (e.g. an unparseable date).
    #[error("invalid value `{value}` for `{field}`")]
    InvalidField { field: String, value: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SalonError {
    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SalonError::Storage {
            source: Box::new(err),
        }
    }
}
