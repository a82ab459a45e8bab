// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{
    CONVERSATION_PROVIDERS, EXTRACTION_PROVIDERS, SalonbookConfig, TRANSCRIPTION_PROVIDERS,
};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &SalonbookConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::validation("server.port must not be 0"));
    }

    check_order(
        "providers.conversation_order",
        &config.providers.conversation_order,
        CONVERSATION_PROVIDERS,
        &mut errors,
    );
    check_order(
        "providers.transcription_order",
        &config.providers.transcription_order,
        TRANSCRIPTION_PROVIDERS,
        &mut errors,
    );
    check_order(
        "providers.extraction_order",
        &config.providers.extraction_order,
        EXTRACTION_PROVIDERS,
        &mut errors,
    );

    if config.providers.conversation_order.is_empty() {
        errors.push(ConfigError::validation(
            "providers.conversation_order must name at least one provider",
        ));
    }

    if config.assistant.history_limit == 0 {
        errors.push(ConfigError::validation(
            "assistant.history_limit must be at least 1",
        ));
    }

    if config.assistant.max_tokens == 0 {
        errors.push(ConfigError::validation(
            "assistant.max_tokens must be at least 1",
        ));
    }

    if config.assistant.pending_ttl_secs == Some(0) {
        errors.push(ConfigError::validation(
            "assistant.pending_ttl_secs must be positive when set",
        ));
    }

    if config.transcription.max_duration_secs == 0 {
        errors.push(ConfigError::validation(
            "transcription.max_duration_secs must be positive",
        ));
    }

    if !(0.0..=1.0).contains(&config.witai.min_confidence) {
        errors.push(ConfigError::validation(format!(
            "witai.min_confidence must be between 0 and 1, got {}",
            config.witai.min_confidence
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_order(key: &str, order: &[String], known: &[&str], errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for name in order {
        if !known.contains(&name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "{key} contains unknown provider `{name}` (known: {})",
                known.join(", ")
            )));
        }
        if !seen.insert(name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "{key} lists `{name}` more than once"
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&SalonbookConfig::default()).is_ok());
    }

    #[test]
    fn unknown_provider_in_order_fails() {
        let mut config = SalonbookConfig::default();
        config.providers.conversation_order = vec!["openai".into(), "cohere".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("`cohere`")));
    }

    #[test]
    fn transcription_provider_not_allowed_in_conversation_order() {
        let mut config = SalonbookConfig::default();
        config.providers.conversation_order = vec!["whisper".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn duplicate_provider_fails() {
        let mut config = SalonbookConfig::default();
        config.providers.transcription_order = vec!["whisper".into(), "whisper".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("more than once")));
    }

    #[test]
    fn empty_conversation_order_fails() {
        let mut config = SalonbookConfig::default();
        config.providers.conversation_order.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_extraction_order_is_allowed() {
        let mut config = SalonbookConfig::default();
        config.providers.extraction_order.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = SalonbookConfig::default();
        config.server.host = "".into();
        config.assistant.history_limit = 0;
        config.storage.database_path = " ".into();
        config.transcription.max_duration_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "{:?}", messages(&errors));
    }

    #[test]
    fn bad_hostname_fails() {
        let mut config = SalonbookConfig::default();
        config.server.host = "salon host!".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_ttl_fails() {
        let mut config = SalonbookConfig::default();
        config.assistant.pending_ttl_secs = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
