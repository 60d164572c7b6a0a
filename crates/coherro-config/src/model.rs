// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Coherro pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Coherro configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoherroConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP/WebSocket listener.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Generative model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Conversation persistence.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Primary renderer and output discovery.
    #[serde(default)]
    pub render: RenderConfig,

    /// Placeholder video encoder used when the primary renderer fails.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Artifact publishing.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Optional S3-compatible object store. Absent credentials mean local-only publishing.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

/// Root directory for ephemeral workspaces and local artifacts (`~/.coherro`).
pub fn coherro_home() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".coherro"))
        .unwrap_or_else(|| std::env::temp_dir().join("coherro"))
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "coherro".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Capacity of each connection's outbound event queue.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Concurrent `POST /v1/prompt` generations; further requests wait.
    #[serde(default = "default_http_concurrency")]
    pub http_concurrency: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            event_buffer: default_event_buffer(),
            http_concurrency: default_http_concurrency(),
        }
    }
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_event_buffer() -> usize {
    64
}

fn default_http_concurrency() -> usize {
    4
}

/// Generative model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Gemini API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Override for the API base URL (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Inline system instruction. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system instruction.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Longest wait for the next text delta before the request fails.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            base_url: None,
            system_prompt: None,
            system_prompt_file: None,
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    8000
}

fn default_stream_idle_timeout_secs() -> u64 {
    60
}

/// Persistence configuration.
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
    coherro_home()
        .join("coherro.db")
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Primary renderer configuration.
///
/// The renderer is invoked as `program args...` with `{script}` and `{scene}`
/// substituted in each argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Directory under which per-request workspaces are created.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Renderer executable.
    #[serde(default = "default_render_program")]
    pub program: String,

    /// Renderer arguments.
    #[serde(default = "default_render_args")]
    pub args: Vec<String>,

    /// Wall-clock budget for one renderer invocation.
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,

    /// File name the code is written to inside the workspace.
    #[serde(default = "default_script_name")]
    pub script_name: String,

    /// Scene identifier used when the code does not declare one.
    #[serde(default = "default_scene_name")]
    pub default_scene: String,

    /// Ordered output path templates; the first existing match wins.
    ///
    /// Tokens: `{workspace}`, `{cwd}`, `{script_stem}`, `{scene}`.
    #[serde(default = "default_output_candidates")]
    pub output_candidates: Vec<String>,

    /// Canonical name of the rendered file inside the workspace.
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            program: default_render_program(),
            args: default_render_args(),
            timeout_secs: default_render_timeout_secs(),
            script_name: default_script_name(),
            default_scene: default_scene_name(),
            output_candidates: default_output_candidates(),
            output_name: default_output_name(),
        }
    }
}

fn default_workspace_root() -> PathBuf {
    coherro_home()
}

fn default_render_program() -> String {
    "python".to_string()
}

fn default_render_args() -> Vec<String> {
    ["-m", "manim", "-ql", "{script}", "{scene}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_render_timeout_secs() -> u64 {
    60
}

fn default_script_name() -> String {
    "scene.py".to_string()
}

fn default_scene_name() -> String {
    "Scene".to_string()
}

fn default_output_candidates() -> Vec<String> {
    [
        "{workspace}/media/videos/{script_stem}/480p15/{scene}.mp4",
        "{workspace}/media/videos/{script_stem}/720p30/{scene}.mp4",
        "{workspace}/media/videos/{script_stem}/1080p60/{scene}.mp4",
        "{cwd}/media/videos/{script_stem}/480p15/{scene}.mp4",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_output_name() -> String {
    "output.mp4".to_string()
}

/// Placeholder encoder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// ffmpeg executable.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Wall-clock budget for one encoder invocation.
    #[serde(default = "default_fallback_timeout_secs")]
    pub timeout_secs: u64,

    /// Frame width in pixels (must be even).
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels (must be even).
    #[serde(default = "default_height")]
    pub height: u32,

    /// Placeholder length in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,

    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Caption drawn over the placeholder.
    #[serde(default = "default_caption")]
    pub caption: String,

    /// Font used for the caption. `None` draws no caption.
    #[serde(default)]
    pub font_file: Option<PathBuf>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_fallback_timeout_secs(),
            width: default_width(),
            height: default_height(),
            duration_secs: default_duration_secs(),
            fps: default_fps(),
            caption: default_caption(),
            font_file: None,
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_fallback_timeout_secs() -> u64 {
    30
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_duration_secs() -> u32 {
    3
}

fn default_fps() -> u32 {
    30
}

fn default_caption() -> String {
    "Fallback: Circle Animation".to_string()
}

/// Artifact publishing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Durable directory for artifacts that could not be uploaded.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// Object key prefix.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Budget for one upload.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            local_dir: default_local_dir(),
            key_prefix: default_key_prefix(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

fn default_local_dir() -> PathBuf {
    coherro_home().join("videos")
}

fn default_key_prefix() -> String {
    "animations".to_string()
}

fn default_upload_timeout_secs() -> u64 {
    60
}

/// S3-compatible object store configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreConfig {
    /// Bucket name. Falls back to `AWS_S3_BUCKET`.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Region. Falls back to `AWS_REGION`, then `us-east-1`.
    #[serde(default)]
    pub region: Option<String>,

    /// Access key id. Falls back to `AWS_ACCESS_KEY_ID`.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key. Falls back to `AWS_SECRET_ACCESS_KEY`.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Custom endpoint (MinIO, LocalStack). Switches to path-style URLs.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[redacted]"),
            )
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
