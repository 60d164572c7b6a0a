// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output discovery: where the renderer may have written its video.
//!
//! Locations are path templates rather than code, so a renderer with a
//! different output layout only needs new configuration.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static SCENE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+(\w+)\s*\(").unwrap());

/// First `class Name(` declared in the code, or `default`.
pub fn detect_scene_name(code: &str, default: &str) -> String {
    SCENE_CLASS
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| default.to_string(), |m| m.as_str().to_string())
}

/// Values substituted into candidate templates.
#[derive(Debug, Clone)]
pub struct CandidateContext<'a> {
    pub workspace: &'a Path,
    pub cwd: &'a Path,
    /// Script file name without extension.
    pub script_stem: &'a str,
    pub scene: &'a str,
}

/// Ordered list of output path templates.
///
/// Supported tokens: `{workspace}`, `{cwd}`, `{script_stem}`, `{scene}`.
#[derive(Debug, Clone)]
pub struct OutputCandidates {
    templates: Vec<String>,
}

impl OutputCandidates {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }

    /// Expand every template, preserving order.
    pub fn resolve(&self, ctx: &CandidateContext<'_>) -> Vec<PathBuf> {
        let workspace = ctx.workspace.to_string_lossy();
        let cwd = ctx.cwd.to_string_lossy();
        self.templates
            .iter()
            .map(|template| {
                PathBuf::from(
                    template
                        .replace("{workspace}", &workspace)
                        .replace("{cwd}", &cwd)
                        .replace("{script_stem}", ctx.script_stem)
                        .replace("{scene}", ctx.scene),
                )
            })
            .collect()
    }

    /// The first resolved path that is an existing file, plus every path tried.
    pub async fn find_first(&self, ctx: &CandidateContext<'_>) -> (Option<PathBuf>, Vec<PathBuf>) {
        let searched = self.resolve(ctx);
        for path in &searched {
            if tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                return (Some(path.clone()), searched);
            }
        }
        (None, searched)
    }
}
