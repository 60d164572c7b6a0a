// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline `coherro parse` and `coherro render` subcommands.

use std::path::Path;

use coherro_agent::install_signal_handler;
use coherro_config::CoherroConfig;
use coherro_core::CoherroError;
use coherro_parser::{ParseResult, TextKind, parse, sanitize};
use coherro_render::RenderOrchestrator;
use serde_json::json;

/// Parse a saved model response and print the fields as JSON.
pub fn run_parse(file: &Path, sanitize_fields: bool) -> Result<(), CoherroError> {
    let text = std::fs::read_to_string(file).map_err(|e| {
        CoherroError::Internal(format!("failed to read {}: {e}", file.display()))
    })?;
    println!("{}", parse_to_json(&text, sanitize_fields)?);
    Ok(())
}

fn parse_to_json(text: &str, sanitize_fields: bool) -> Result<String, CoherroError> {
    let parsed = parse(text);
    let result = if sanitize_fields {
        ParseResult {
            code: sanitize(TextKind::Code, &parsed.code),
            explanation: sanitize(TextKind::Explanation, &parsed.explanation),
            ..parsed
        }
    } else {
        parsed
    };
    serde_json::to_string_pretty(&result)
        .map_err(|e| CoherroError::Internal(format!("failed to serialize parse result: {e}")))
}

/// Render a scene script with the configured renderer and copy the video to `out`.
pub async fn run_render(
    config: &CoherroConfig,
    script: &Path,
    out: &Path,
) -> Result<(), CoherroError> {
    let code = tokio::fs::read_to_string(script).await.map_err(|e| {
        CoherroError::Internal(format!("failed to read {}: {e}", script.display()))
    })?;

    let orchestrator = RenderOrchestrator::from_config(config);
    let cancel = install_signal_handler();
    let artifact = orchestrator.render(&code, &cancel).await?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoherroError::render("failed to create output directory", e))?;
    }
    tokio::fs::copy(artifact.local_path(), out)
        .await
        .map_err(|e| CoherroError::render("failed to copy rendered video", e))?;

    let summary = json!({
        "output": out.display().to_string(),
        "usedFallback": artifact.used_fallback,
        "durationBudgetExceeded": artifact.duration_budget_exceeded,
        "diagnostic": artifact.diagnostic,
    });
    println!("{summary:#}");
    Ok(())
}
