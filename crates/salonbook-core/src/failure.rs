// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized failure values returned by provider adapters.
//!
//! Every adapter converts its transport and API errors into a
//! [`ProviderFailure`]. The classification decides whether the fallback
//! orchestrator takes the provider out of rotation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Classification of a provider failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Quota, rate-limit or billing exhaustion.
    QuotaExceeded,
    /// Rejected credentials, or no credentials configured.
    AuthError,
    /// Connection errors, timeouts and 5xx responses.
    TransientNetwork,
    /// The provider answered but the payload was unusable.
    MalformedResponse,
}

impl FailureKind {
    /// Whether this failure takes the provider out of rotation for the
    /// remainder of the process.
    pub fn disables_provider(self) -> bool {
        matches!(self, FailureKind::QuotaExceeded | FailureKind::AuthError)
    }
}

/// A classified failure from a single provider invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(FailureKind::QuotaExceeded, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FailureKind::AuthError, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransientNetwork, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, message)
    }

    /// Failure used for adapters constructed without an API key.
    pub fn missing_key() -> Self {
        Self::auth("API key not configured")
    }

    /// Classifies a non-success HTTP response.
    ///
    /// Providers are inconsistent about quota signalling (some send 400 or
    /// 403 with a billing message), so the body is inspected before the
    /// status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lower = body.to_ascii_lowercase();
        let excerpt = truncate(body, 300);
        let quota_markers = [
            "quota",
            "rate limit",
            "rate_limit",
            "resource_exhausted",
            "insufficient_quota",
            "billing",
            "credit balance",
        ];

        if status == 429 || quota_markers.iter().any(|m| lower.contains(m)) {
            return Self::quota(format!("HTTP {status}: {excerpt}"));
        }
        match status {
            401 | 403 => Self::auth(format!("HTTP {status}: {excerpt}")),
            408 | 500..=599 => Self::transient(format!("HTTP {status}: {excerpt}")),
            _ => Self::malformed(format!("request rejected with HTTP {status}: {excerpt}")),
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_and_auth_disable_provider() {
        assert!(FailureKind::QuotaExceeded.disables_provider());
        assert!(FailureKind::AuthError.disables_provider());
        assert!(!FailureKind::TransientNetwork.disables_provider());
        assert!(!FailureKind::MalformedResponse.disables_provider());
    }

    #[test]
    fn status_429_is_quota() {
        let f = ProviderFailure::from_status(429, "slow down");
        assert_eq!(f.kind, FailureKind::QuotaExceeded);
    }

    #[test]
    fn quota_message_in_400_body_is_quota() {
        let f = ProviderFailure::from_status(
            400,
            r#"{"error":{"code":"insufficient_quota","message":"You exceeded your current quota"}}"#,
        );
        assert_eq!(f.kind, FailureKind::QuotaExceeded);
    }

    #[test]
    fn unauthorized_is_auth_error() {
        assert_eq!(
            ProviderFailure::from_status(401, "invalid key").kind,
            FailureKind::AuthError
        );
        assert_eq!(
            ProviderFailure::from_status(403, "forbidden").kind,
            FailureKind::AuthError
        );
    }

    #[test]
    fn server_errors_are_transient() {
        for status in [500, 502, 503, 529, 408] {
            assert_eq!(
                ProviderFailure::from_status(status, "oops").kind,
                FailureKind::TransientNetwork,
                "status {status}"
            );
        }
    }

    #[test]
    fn other_client_errors_are_malformed() {
        let f = ProviderFailure::from_status(400, "bad model name");
        assert_eq!(f.kind, FailureKind::MalformedResponse);
        assert!(f.message.contains("400"));
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(400);
        let f = ProviderFailure::from_status(500, &body);
        assert!(f.message.len() < 400);
    }

    #[test]
    fn failure_display_includes_kind() {
        let f = ProviderFailure::quota("limit reached");
        assert_eq!(f.to_string(), "quota-exceeded: limit reached");
    }

    proptest::proptest! {
        #[test]
        fn classification_never_panics_and_keeps_status(status in 100u16..600, body in ".{0,600}") {
            let f = ProviderFailure::from_status(status, &body);
            proptest::prop_assert!(f.message.contains(&status.to_string()));
            if status == 429 {
                proptest::prop_assert_eq!(f.kind, FailureKind::QuotaExceeded);
            }
        }
    }
}
