// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./salonbook.toml` > `~/.config/salonbook/salonbook.toml` >
//! `/etc/salonbook/salonbook.toml`, with `SALONBOOK_` environment overrides
//! on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SalonbookConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/salonbook/salonbook.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "salonbook.toml";

/// Config sections, used to map `SALONBOOK_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &[
    "server",
    "gateway",
    "assistant",
    "providers",
    "openai",
    "gemini",
    "anthropic",
    "deepgram",
    "witai",
    "transcription",
    "storage",
];

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("salonbook").join("salonbook.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/salonbook/salonbook.toml`
/// 3. `~/.config/salonbook/salonbook.toml`
/// 4. `./salonbook.toml`
/// 5. `SALONBOOK_*` environment variables
pub fn load_config() -> Result<SalonbookConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SalonbookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SalonbookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `SALONBOOK_OPENAI_API_KEY` to `openai.api_key`.
///
/// Uses an explicit section list rather than `Env::split("_")`, because key
/// names themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("SALONBOOK_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name to a lowercase dotted config path.
///
/// Figment hands over the key in its original case (`OPENAI_API_KEY`).
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
