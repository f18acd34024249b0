// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tokendiet.toml` > `~/.config/tokendiet/tokendiet.toml`
//! > `/etc/tokendiet/tokendiet.toml` with environment variable overrides via the
//! `TOKENDIET_` prefix. `GROQ_API_KEY` is honoured as the provider API key.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TokenDietConfig;

/// Name of the config file searched in each hierarchy level.
pub const CONFIG_FILE_NAME: &str = "tokendiet.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tokendiet/tokendiet.toml` (system-wide)
/// 3. `~/.config/tokendiet/tokendiet.toml` (user XDG config)
/// 4. `./tokendiet.toml` (local directory)
/// 5. `TOKENDIET_*` environment variables
/// 6. `GROQ_API_KEY`
pub fn load_config() -> Result<TokenDietConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TokenDietConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TokenDietConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TokenDietConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TokenDietConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(groq_key_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TokenDietConfig::default()))
        .merge(Toml::file(Path::new("/etc/tokendiet").join(CONFIG_FILE_NAME)))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tokendiet").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
        .merge(groq_key_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TOKENDIET_PROVIDER_API_KEY` must map to `provider.api_key`,
/// not `provider.api.key`.
fn env_provider() -> Env {
    Env::prefixed("TOKENDIET_").map(|key| map_env_key(key.as_str()).into())
}

const SECTIONS: [&str; 7] = [
    "agent",
    "provider",
    "routing",
    "retrieval",
    "storage",
    "judge",
    "pricing",
];

/// Maps a prefix-stripped variable name such as `PROVIDER_API_KEY` onto its
/// dotted config path (`provider.api_key`).
///
/// Figment hands the key over in its original case, so it is lowercased
/// before the section is split off.
fn map_env_key(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(field) = lower
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    lower
}

/// Maps the conventional `GROQ_API_KEY` variable onto `provider.api_key`.
fn groq_key_provider() -> Env {
    Env::raw()
        .only(&["GROQ_API_KEY"])
        .map(|_| "provider.api_key".into())
}
