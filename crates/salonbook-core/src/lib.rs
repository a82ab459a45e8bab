// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Salonbook admin assistant.
//!
//! This crate provides the trait definitions, error types, and common types
//! used throughout the workspace. Provider adapters and the storage backend
//! implement traits defined here.

pub mod error;
pub mod failure;
pub mod traits;
pub mod types;

pub use error::SalonError;
pub use failure::{FailureKind, ProviderFailure};
pub use types::{AdapterType, Capability, HealthStatus, Role, SessionId};

pub use traits::{
    ConversationAdapter, ExtractionAdapter, PluginAdapter, ProviderAdapter, SalonStore,
    TranscriptionAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salon_error_variants_render() {
        let cases = [
            (SalonError::Config("bad".into()), "configuration error: bad"),
            (
                SalonError::DatabaseWrite("disk full".into()),
                "database write failed: disk full",
            ),
            (
                SalonError::NotFound {
                    entity: "booking",
                    id: "b-1".into(),
                },
                "booking `b-1` not found",
            ),
            (
                SalonError::MissingField {
                    action: "ADD_EMPLOYEE".into(),
                    field: "email".into(),
                },
                "missing required field `email` for ADD_EMPLOYEE",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = SalonError::storage(std::io::Error::other("locked"));
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_store<T: SalonStore>() {}
        fn _assert_conversation(_: &ConversationAdapter) {}
        fn _assert_transcription(_: &TranscriptionAdapter) {}
        fn _assert_extraction(_: &ExtractionAdapter) {}
    }
}
