// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Coherro configuration system.

use std::io::Write;

use coherro_config::diagnostic::ConfigError;
use coherro_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Every section deserializes from a full TOML document.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "worker-a"
log_level = "debug"

[gateway]
host = "127.0.0.1"
port = 3001

[model]
api_key = "gm-123"
model = "gemini-2.0-pro"
max_output_tokens = 4096
stream_idle_timeout_secs = 15

[storage]
database_path = "/tmp/coherro-test.db"
wal_mode = false

[render]
program = "manim"
args = ["-ql", "{script}", "{scene}"]
timeout_secs = 120
output_candidates = ["{workspace}/out/{scene}.mp4"]

[fallback]
ffmpeg_path = "/usr/bin/ffmpeg"
width = 640
height = 360
caption = "placeholder"

[publish]
local_dir = "/var/lib/coherro/videos"
key_prefix = "renders"

[object_store]
bucket = "clips"
region = "eu-west-1"
access_key_id = "AKIA"
secret_access_key = "s3cr3t"
endpoint = "http://localhost:9000"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.agent.name, "worker-a");
    assert_eq!(config.gateway.port, 3001);
    assert_eq!(config.model.api_key.as_deref(), Some("gm-123"));
    assert_eq!(config.model.stream_idle_timeout_secs, 15);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.render.program, "manim");
    assert_eq!(config.render.args.len(), 3);
    assert_eq!(config.render.output_candidates, vec!["{workspace}/out/{scene}.mp4"]);
    assert_eq!(config.fallback.width, 640);
    assert_eq!(config.fallback.fps, 30);
    assert_eq!(config.publish.key_prefix, "renders");
    assert_eq!(config.object_store.bucket.as_deref(), Some("clips"));
    assert_eq!(
        config.object_store.endpoint.as_deref(),
        Some("http://localhost:9000")
    );
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config");
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.render.default_scene, "Scene");
    assert_eq!(config.fallback.caption, "Fallback: Circle Animation");
}

/// A typo inside a section surfaces as UnknownKey with a suggestion.
#[test]
fn typo_in_render_section_suggests_correction() {
    let errors = load_and_validate_str("[render]\nprogam = \"python\"\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert!(key.ends_with("progam"));
            assert_eq!(suggestion.as_deref(), Some("program"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level sections are rejected.
#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telemetry]\nenabled = true\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

/// A string where a number is expected is an InvalidType error.
#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "gateway.port"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_surface_from_str() {
    let errors = load_and_validate_str("[fallback]\nfps = 0\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { key, .. } if key == "fallback.fps"));
}

/// Environment variables override file values by section prefix.
#[test]
#[serial]
fn env_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[model]\nmodel = \"from-file\"\n[object_store]\nbucket = \"file-bucket\"").unwrap();

    unsafe {
        std::env::set_var("COHERRO_MODEL_MODEL", "from-env");
        std::env::set_var("COHERRO_OBJECT_STORE_BUCKET", "env-bucket");
        std::env::set_var("COHERRO_RENDER_TIMEOUT_SECS", "90");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("COHERRO_MODEL_MODEL");
        std::env::remove_var("COHERRO_OBJECT_STORE_BUCKET");
        std::env::remove_var("COHERRO_RENDER_TIMEOUT_SECS");
    }

    let config = result.expect("config with env overrides");
    assert_eq!(config.model.model, "from-env");
    assert_eq!(config.object_store.bucket.as_deref(), Some("env-bucket"));
    assert_eq!(config.render.timeout_secs, 90);
}

/// Typos in an explicit file are reported with a suggestion.
#[test]
#[serial]
fn file_typos_are_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[gateway]\nhots = \"localhost\"").unwrap();

    let errors = load_and_validate_path(file.path()).unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("host"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}
