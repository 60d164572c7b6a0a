// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder video encoder used when the primary renderer fails.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::diagnostic::{RenderFailure, STDERR_TAIL_BYTES, tail_lossy};

/// Produces a short synthetic video at a given path.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    async fn encode_placeholder(
        &self,
        out_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), RenderFailure>;
}

/// Placeholder geometry and caption.
#[derive(Debug, Clone)]
pub struct PlaceholderSpec {
    pub width: u32,
    pub height: u32,
    pub duration_secs: u32,
    pub fps: u32,
    pub caption: String,
    /// Caption is only drawn when a font file is configured.
    pub font_file: Option<PathBuf>,
}

/// Encodes a moving blue box over a white background with the system `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    timeout: Duration,
    spec: PlaceholderSpec,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration, spec: PlaceholderSpec) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            spec,
        }
    }

    /// Full ffmpeg argument list for writing the placeholder to `out_path`.
    pub fn args(&self, out_path: &Path) -> Vec<String> {
        let PlaceholderSpec {
            width,
            height,
            duration_secs,
            fps,
            ..
        } = self.spec;

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            format!("color=c=white:size={width}x{height}:duration={duration_secs}:rate={fps}"),
            "-vf".into(),
            self.filter_graph(),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            fps.to_string(),
        ];
        args.push(out_path.to_string_lossy().into_owned());
        args
    }

    fn filter_graph(&self) -> String {
        let spec = &self.spec;
        let travel = spec.width.saturating_sub(200);
        let y = (spec.height / 2).saturating_sub(50);
        let mut filter = format!(
            "drawbox=x=100+{travel}*t/{}-50:y={y}:w=100:h=100:color=blue:t=fill",
            spec.duration_secs
        );
        if let Some(font) = &spec.font_file {
            filter.push_str(&format!(
                ",drawtext=fontfile='{}':text='{}':fontsize=24:fontcolor=black:x=(w-text_w)/2:y=h-80",
                escape_filter_value(&font.to_string_lossy()),
                escape_filter_value(&spec.caption),
            ));
        }
        filter
    }
}

/// Escape a value embedded in a single-quoted ffmpeg filter option.
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode_placeholder(
        &self,
        out_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), RenderFailure> {
        let args = self.args(out_path);
        debug!(binary = %self.binary.display(), ?args, "encoding placeholder");

        let child = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderFailure::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = tokio::time::sleep(self.timeout) => {
                return Err(RenderFailure::TimedOut { after: self.timeout });
            }
            _ = cancel.cancelled() => return Err(RenderFailure::Cancelled),
        };

        if !output.status.success() {
            return Err(RenderFailure::NonZeroExit {
                code: output.status.code(),
                stderr_tail: tail_lossy(&output.stderr, STDERR_TAIL_BYTES),
            });
        }
        if !tokio::fs::try_exists(out_path).await? {
            return Err(RenderFailure::OutputMissing {
                searched: vec![out_path.to_path_buf()],
            });
        }

        info!(path = %out_path.display(), "placeholder video encoded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PlaceholderSpec {
        PlaceholderSpec {
            width: 1920,
            height: 1080,
            duration_secs: 3,
            fps: 30,
            caption: "Fallback: Circle Animation".into(),
            font_file: None,
        }
    }

    #[test]
    fn args_describe_moving_box() {
        let encoder = FfmpegEncoder::new("ffmpeg", Duration::from_secs(30), spec());
        let args = encoder.args(Path::new("/ws/output.mp4"));
        assert_eq!(args.first().map(String::as_str), Some("-y"));
        assert!(args.contains(&"color=c=white:size=1920x1080:duration=3:rate=30".to_string()));
        assert!(args.contains(
            &"drawbox=x=100+1720*t/3-50:y=490:w=100:h=100:color=blue:t=fill".to_string()
        ));
        assert_eq!(args.last().map(String::as_str), Some("/ws/output.mp4"));
    }

    #[test]
    fn caption_requires_font_file() {
        let mut with_font = spec();
        with_font.font_file = Some(PathBuf::from("/fonts/Sans.ttf"));
        let encoder = FfmpegEncoder::new("ffmpeg", Duration::from_secs(30), with_font);
        let filter = encoder.filter_graph();
        assert!(filter.contains("drawtext=fontfile='/fonts/Sans.ttf'"));
        assert!(filter.contains("text='Fallback\\: Circle Animation'"));

        let plain = FfmpegEncoder::new("ffmpeg", Duration::from_secs(30), spec());
        assert!(!plain.filter_graph().contains("drawtext"));
    }

    #[test]
    fn filter_values_are_escaped() {
        assert_eq!(escape_filter_value("it's a:b"), "it\\'s a\\:b");
    }

    #[tokio::test]
    async fn encoder_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = FfmpegEncoder::new("false", Duration::from_secs(5), spec());
        let err = encoder
            .encode_placeholder(&dir.path().join("out.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::NonZeroExit { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg", Duration::from_secs(5), spec());
        let err = encoder
            .encode_placeholder(&dir.path().join("out.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::Spawn { .. }));
    }
}
