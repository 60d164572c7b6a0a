// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: bindable hosts, non-zero budgets,
//! encoder geometry and paired credentials.

use crate::diagnostic::ConfigError;
use crate::model::CoherroConfig;

/// Validate a deserialized configuration, collecting every failure.
pub fn validate_config(config: &CoherroConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::invalid("gateway.host", "must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(
            "gateway.host",
            format!("`{host}` is not a valid IP address or hostname"),
        ));
    }

    if config.gateway.event_buffer == 0 {
        errors.push(ConfigError::invalid("gateway.event_buffer", "must be at least 1"));
    }
    if config.gateway.http_concurrency == 0 {
        errors.push(ConfigError::invalid("gateway.http_concurrency", "must be at least 1"));
    }

    if config.model.model.trim().is_empty() {
        errors.push(ConfigError::invalid("model.model", "must not be empty"));
    }
    if config.model.max_output_tokens == 0 {
        errors.push(ConfigError::invalid(
            "model.max_output_tokens",
            "must be greater than 0",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if config.render.program.trim().is_empty() {
        errors.push(ConfigError::invalid("render.program", "must not be empty"));
    }
    if config.render.output_candidates.is_empty() {
        errors.push(ConfigError::invalid(
            "render.output_candidates",
            "must list at least one path template",
        ));
    }
    for name_key in [
        ("render.script_name", &config.render.script_name),
        ("render.output_name", &config.render.output_name),
    ] {
        let (key, name) = name_key;
        if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
            errors.push(ConfigError::invalid(
                key,
                format!("`{name}` must be a plain file name"),
            ));
        }
    }

    if config.fallback.width == 0 || config.fallback.width % 2 != 0 {
        errors.push(ConfigError::invalid(
            "fallback.width",
            format!("must be a non-zero even number, got {}", config.fallback.width),
        ));
    }
    if config.fallback.height == 0 || config.fallback.height % 2 != 0 {
        errors.push(ConfigError::invalid(
            "fallback.height",
            format!(
                "must be a non-zero even number, got {}",
                config.fallback.height
            ),
        ));
    }
    if config.fallback.duration_secs == 0 {
        errors.push(ConfigError::invalid(
            "fallback.duration_secs",
            "must be greater than 0",
        ));
    }
    if config.fallback.fps == 0 {
        errors.push(ConfigError::invalid("fallback.fps", "must be greater than 0"));
    }

    for (key, secs) in [
        ("model.stream_idle_timeout_secs", config.model.stream_idle_timeout_secs),
        ("render.timeout_secs", config.render.timeout_secs),
        ("fallback.timeout_secs", config.fallback.timeout_secs),
        ("publish.upload_timeout_secs", config.publish.upload_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ConfigError::invalid(key, "must be greater than 0"));
        }
    }

    let store = &config.object_store;
    if store.access_key_id.is_some() != store.secret_access_key.is_some() {
        errors.push(ConfigError::invalid(
            "object_store.secret_access_key",
            "access_key_id and secret_access_key must be set together",
        ));
    }
    if let Some(endpoint) = &store.endpoint
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        errors.push(ConfigError::invalid(
            "object_store.endpoint",
            format!("`{endpoint}` must start with http:// or https://"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&CoherroConfig::default()).is_ok());
    }

    #[test]
    fn odd_fallback_geometry_fails() {
        let config = load_config_from_str("[fallback]\nwidth = 1921\nheight = 0\n").unwrap();
        let errors = validate_config(&config).unwrap_err();
        let msgs = messages(&errors);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].contains("fallback.width"));
        assert!(msgs[1].contains("fallback.height"));
    }

    #[test]
    fn zero_timeouts_are_all_reported() {
        let config = load_config_from_str(
            "[render]\ntimeout_secs = 0\n[fallback]\ntimeout_secs = 0\n",
        )
        .unwrap();
        let msgs = messages(&validate_config(&config).unwrap_err());
        assert!(msgs.iter().any(|m| m.contains("render.timeout_secs")));
        assert!(msgs.iter().any(|m| m.contains("fallback.timeout_secs")));
    }

    #[test]
    fn half_configured_credentials_fail() {
        let config =
            load_config_from_str("[object_store]\naccess_key_id = \"AKIA\"\n").unwrap();
        let msgs = messages(&validate_config(&config).unwrap_err());
        assert!(msgs[0].contains("must be set together"));
    }

    #[test]
    fn script_name_with_path_fails() {
        let config = load_config_from_str("[render]\nscript_name = \"../x.py\"\n").unwrap();
        let msgs = messages(&validate_config(&config).unwrap_err());
        assert!(msgs[0].contains("render.script_name"));
    }

    #[test]
    fn bad_endpoint_scheme_fails() {
        let config =
            load_config_from_str("[object_store]\nendpoint = \"localhost:9000\"\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn hostname_and_ipv6_hosts_pass() {
        for host in ["localhost", "::1", "worker-1.internal"] {
            let config =
                load_config_from_str(&format!("[gateway]\nhost = \"{host}\"\n")).unwrap();
            assert!(validate_config(&config).is_ok(), "{host} should be valid");
        }
    }
}
