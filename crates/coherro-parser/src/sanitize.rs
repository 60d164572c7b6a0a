// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cleanup rules applied to extracted code and explanations once the stream ends.
//!
//! Every rule only ever removes or shortens text, so repeating the passes until
//! nothing changes always terminates, and the result is stable under a second
//! application.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use strum::{Display, EnumString};

/// Which field a piece of text was extracted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Code,
    Explanation,
}

/// Three or more newlines, possibly with whitespace-only lines between.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\r?\n){2,}").unwrap());

static FENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap());

static CODE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?code>").unwrap());

static CODE_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:here(?:'s|’s| is) the code\b|the code defines\b)[^\n]*(?:\n|$)")
        .unwrap()
});

static EXPLANATION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?explanation>").unwrap());

static BOLD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*explanation:\*\*").unwrap());

static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*explanation:").unwrap());

/// Clean up extracted text. Never fails; input without any markers comes back trimmed.
pub fn sanitize(kind: TextKind, text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pass(kind, &current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn pass(kind: TextKind, text: &str) -> String {
    let mut out = if !text.contains('\n') && text.contains("\\n") {
        text.replace("\\n", "\n")
    } else {
        text.to_string()
    };

    out = match kind {
        TextKind::Code => {
            let out = FENCE_MARKER.replace_all(&out, "");
            let out = CODE_TAG.replace_all(&out, "");
            CODE_PREAMBLE.replace_all(&out, "").into_owned()
        }
        TextKind::Explanation => {
            let out = EXPLANATION_TAG.replace_all(&out, "");
            let out = BOLD_LABEL.replace_all(&out, "");
            LEADING_LABEL.replace(&out, "").into_owned()
        }
    };

    BLANK_RUN.replace_all(&out, "\n\n").trim().to_string()
}
