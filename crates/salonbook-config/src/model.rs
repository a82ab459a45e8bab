// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Provider names accepted in `providers.conversation_order`.
pub const CONVERSATION_PROVIDERS: &[&str] = &["openai", "gemini", "anthropic"];

/// Provider names accepted in `providers.transcription_order`.
pub const TRANSCRIPTION_PROVIDERS: &[&str] = &["whisper", "deepgram"];

/// Provider names accepted in `providers.extraction_order`.
pub const EXTRACTION_PROVIDERS: &[&str] = &["witai", "keywords"];

/// Top-level Salonbook configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SalonbookConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub deepgram: DeepgramConfig,

    #[serde(default)]
    pub witai: WitAiConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Placeholder substituted for secrets by [`SalonbookConfig::redacted`].
pub const REDACTED: &str = "[redacted]";

impl SalonbookConfig {
    /// A copy with every credential replaced by [`REDACTED`], for display.
    pub fn redacted(&self) -> Self {
        fn mask(secret: &Option<String>) -> Option<String> {
            secret.as_ref().map(|_| REDACTED.to_string())
        }
        let mut out = self.clone();
        out.gateway.bearer_token = mask(&self.gateway.bearer_token);
        out.openai.api_key = mask(&self.openai.api_key);
        out.gemini.api_key = mask(&self.gemini.api_key);
        out.anthropic.api_key = mask(&self.anthropic.api_key);
        out.deepgram.api_key = mask(&self.deepgram.api_key);
        out.witai.token = mask(&self.witai.token);
        out
    }
}

/// HTTP listener and process settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP surface settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Bearer token required on `/api/*`. `None` leaves the API open.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Largest accepted audio upload in bytes.
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            max_audio_bytes: default_max_audio_bytes(),
        }
    }
}

fn default_max_audio_bytes() -> usize {
    10 * 1024 * 1024
}

/// Conversation behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// Name the assistant introduces itself with.
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Replaces the built-in instructions when set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Number of prior messages sent to conversation providers.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum tokens requested from conversation providers.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Drop a half-collected action after this many idle seconds.
    /// Unset keeps pending actions for the process lifetime.
    #[serde(default)]
    pub pending_ttl_secs: Option<u64>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            system_prompt: None,
            history_limit: default_history_limit(),
            max_tokens: default_max_tokens(),
            pending_ttl_secs: None,
        }
    }
}

fn default_assistant_name() -> String {
    "Salon Assistant".to_string()
}

fn default_history_limit() -> usize {
    12
}

fn default_max_tokens() -> u32 {
    1024
}

/// Fallback chain ordering per capability.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default = "default_conversation_order")]
    pub conversation_order: Vec<String>,

    #[serde(default = "default_transcription_order")]
    pub transcription_order: Vec<String>,

    #[serde(default = "default_extraction_order")]
    pub extraction_order: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            conversation_order: default_conversation_order(),
            transcription_order: default_transcription_order(),
            extraction_order: default_extraction_order(),
        }
    }
}

fn default_conversation_order() -> Vec<String> {
    vec!["openai".into(), "gemini".into(), "anthropic".into()]
}

fn default_transcription_order() -> Vec<String> {
    vec!["whisper".into(), "deepgram".into()]
}

fn default_extraction_order() -> Vec<String> {
    vec!["witai".into()]
}

/// OpenAI chat-completions and Whisper settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_openai_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            chat_model: default_openai_chat_model(),
            transcription_model: default_openai_transcription_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Google Gemini settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Falls back to `GEMINI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Falls back to `ANTHROPIC_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    #[serde(default = "default_anthropic_model")]
    pub model: String,

    #[serde(default = "default_anthropic_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
            api_version: default_anthropic_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_anthropic_api_version() -> String {
    "2023-06-01".to_string()
}

/// Deepgram pre-recorded transcription settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeepgramConfig {
    /// Falls back to `DEEPGRAM_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_deepgram_base_url")]
    pub base_url: String,

    #[serde(default = "default_deepgram_model")]
    pub model: String,

    #[serde(default = "default_deepgram_language")]
    pub language: String,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_deepgram_base_url(),
            model: default_deepgram_model(),
            language: default_deepgram_language(),
        }
    }
}

fn default_deepgram_base_url() -> String {
    "https://api.deepgram.com/v1/listen".to_string()
}

fn default_deepgram_model() -> String {
    "nova-2".to_string()
}

fn default_deepgram_language() -> String {
    "en".to_string()
}

/// Wit.ai entity-extraction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WitAiConfig {
    /// Server access token. Falls back to `WIT_AI_TOKEN` when unset.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_witai_base_url")]
    pub base_url: String,

    /// Value of the `v` query parameter.
    #[serde(default = "default_witai_api_version")]
    pub api_version: String,

    /// Intents below this confidence are reported as unrecognized.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for WitAiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_witai_base_url(),
            api_version: default_witai_api_version(),
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_witai_base_url() -> String {
    "https://api.wit.ai".to_string()
}

fn default_witai_api_version() -> String {
    "20240304".to_string()
}

fn default_min_confidence() -> f32 {
    0.6
}

/// Speech-to-text behaviour shared by all transcription providers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionConfig {
    /// Wall-clock cap on a single provider call.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

fn default_max_duration_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("salonbook").join("salonbook.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("salonbook.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}
