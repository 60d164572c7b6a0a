// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./coherro.toml` > `~/.config/coherro/coherro.toml` > `/etc/coherro/coherro.toml`
//! with environment variable overrides via `COHERRO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CoherroConfig;

/// Config sections that environment variables may address, longest first so
/// `object_store_` wins over any shorter prefix.
const ENV_SECTIONS: &[&str] = &[
    "object_store",
    "fallback",
    "gateway",
    "publish",
    "storage",
    "render",
    "agent",
    "model",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/coherro/coherro.toml` (system-wide)
/// 3. `~/.config/coherro/coherro.toml` (user XDG config)
/// 4. `./coherro.toml` (local directory)
/// 5. `COHERRO_*` environment variables
pub fn load_config() -> Result<CoherroConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CoherroConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CoherroConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CoherroConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CoherroConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CoherroConfig::default()))
        .merge(Toml::file("/etc/coherro/coherro.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("coherro/coherro.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("coherro.toml"))
        .merge(env_provider())
}

/// Map an env var key (prefix stripped, lowercased) to a dotted config path.
///
/// `model_api_key` -> `model.api_key`, `object_store_bucket` -> `object_store.bucket`.
/// Keys that do not start with a known section are passed through unchanged.
pub fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Environment provider using an explicit section-prefix map.
///
/// `Env::split("_")` would turn `COHERRO_MODEL_API_KEY` into `model.api.key`,
/// so keys are mapped by known section prefix instead.
fn env_provider() -> Env {
    Env::prefixed("COHERRO_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}
