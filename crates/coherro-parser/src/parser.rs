// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental parser for streamed model responses.
//!
//! [`parse`] is called with the entire text received so far and returns a fresh
//! [`ParseResult`] each time. It keeps no state between calls, so re-parsing
//! the same text always yields the same result regardless of how the stream
//! was chunked.
//!
//! Each field is extracted by an ordered list of matcher strategies. The first
//! strategy that recognizes its opening marker decides the field, even if its
//! closing marker has not arrived yet (the field is then empty until it does).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use strum::Display;

const CODE_OPEN: &str = "<code>";
const CODE_CLOSE: &str = "</code>";
const EXPLANATION_OPEN: &str = "<explanation>";
const EXPLANATION_CLOSE: &str = "</explanation>";

/// Closed fenced block with an optional language tag.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n(.*?)```").unwrap());

/// Line-leading `Explanation:` label, optionally bolded.
static EXPLANATION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\*\*)?explanation:(?:\*\*)?[ \t]*(?:\r?\n)?").unwrap()
});

/// Blank line terminating a labelled explanation.
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\r?\n").unwrap());

/// Leading label stripped from the text that follows a code block.
static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\*\*)?explanation:(?:\*\*)?\s*").unwrap());

/// How far a response has progressed, derived from the same text as the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// No complete code block yet.
    AwaitingCode,
    /// Code is complete; the explanation is missing or still open.
    AwaitingExplanation,
    /// Both code and a terminated explanation are present.
    Done,
}

/// Fields extracted from the accumulated response text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub code: String,
    pub explanation: String,
    /// The whole trimmed text when no code block was found.
    pub leftover: String,
    pub phase: Phase,
}

impl ParseResult {
    /// Non-empty fields joined by newlines, in code, explanation, leftover order.
    pub fn full_text(&self) -> String {
        [&self.code, &self.explanation, &self.leftover]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of one matcher strategy against the full text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match<'a> {
    /// This strategy's marker is absent; the next strategy is consulted.
    Absent,
    /// Opening marker seen, body incomplete. Stops the strategy chain.
    Open,
    /// Complete body spanning `start..end`, markers included.
    Closed {
        body: &'a str,
        start: usize,
        end: usize,
    },
}

impl<'a> Match<'a> {
    fn body(self) -> &'a str {
        match self {
            Match::Closed { body, .. } => body,
            _ => "",
        }
    }
}

type Strategy = for<'a> fn(&'a str) -> Match<'a>;

const CODE_STRATEGIES: &[Strategy] = &[tagged_code, fenced_code];

fn first_match<'a>(strategies: &[Strategy], text: &'a str) -> Match<'a> {
    strategies
        .iter()
        .map(|strategy| strategy(text))
        .find(|m| *m != Match::Absent)
        .unwrap_or(Match::Absent)
}

fn tagged<'a>(text: &'a str, open: &str, close: &str) -> Match<'a> {
    let Some(start) = text.find(open) else {
        return Match::Absent;
    };
    let body_start = start + open.len();
    match text[body_start..].find(close) {
        Some(rel) => Match::Closed {
            body: text[body_start..body_start + rel].trim(),
            start,
            end: body_start + rel + close.len(),
        },
        None => Match::Open,
    }
}

fn tagged_code(text: &str) -> Match<'_> {
    tagged(text, CODE_OPEN, CODE_CLOSE)
}

fn fenced_code(text: &str) -> Match<'_> {
    let Some(start) = text.find("```") else {
        return Match::Absent;
    };
    match FENCED_BLOCK.captures(&text[start..]) {
        Some(caps) => {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                return Match::Open;
            };
            Match::Closed {
                body: body.as_str().trim(),
                start: start + whole.start(),
                end: start + whole.end(),
            }
        }
        None => Match::Open,
    }
}

/// Explanation extraction outcome, with whether it is known to be complete.
struct Explanation<'a> {
    text: &'a str,
    terminated: bool,
}

const NO_EXPLANATION: Explanation<'static> = Explanation {
    text: "",
    terminated: false,
};

fn explanation<'a>(text: &'a str, code: Match<'a>) -> Explanation<'a> {
    match tagged(text, EXPLANATION_OPEN, EXPLANATION_CLOSE) {
        Match::Closed { body, .. } => {
            return Explanation {
                text: body,
                terminated: true,
            };
        }
        Match::Open => return NO_EXPLANATION,
        Match::Absent => {}
    }

    // Labels are only searched outside code: anywhere around a closed block,
    // or anywhere when no block was started.
    let (code_start, code_end) = match code {
        Match::Closed { start, end, .. } => (start, end),
        Match::Absent => (text.len(), text.len()),
        Match::Open => return NO_EXPLANATION,
    };

    let label = EXPLANATION_LABEL
        .find_iter(text)
        .find(|m| m.start() < code_start || m.start() >= code_end);
    if let Some(label) = label {
        // A label ahead of the code runs at most up to the code block.
        let (body, capped) = if label.end() <= code_start && code_start < text.len() {
            (&text[label.end()..code_start], true)
        } else {
            (&text[label.end()..], false)
        };
        return match BLANK_LINE.find(body) {
            Some(blank) => Explanation {
                text: body[..blank.start()].trim(),
                terminated: true,
            },
            None => Explanation {
                text: body.trim(),
                terminated: capped,
            },
        };
    }

    let region = &text[code_end..];
    if matches!(code, Match::Closed { .. }) {
        let tail = region.trim();
        if is_marker_prefix(tail) {
            return NO_EXPLANATION;
        }
        let label_len = LEADING_LABEL.find(tail).map_or(0, |m| m.end());
        return Explanation {
            text: tail[label_len..].trim(),
            terminated: false,
        };
    }

    NO_EXPLANATION
}

/// True when `tail` could still grow into an explanation marker or label.
fn is_marker_prefix(tail: &str) -> bool {
    if tail.is_empty() {
        return false;
    }
    let lower = tail.to_ascii_lowercase();
    [EXPLANATION_OPEN, "explanation:", "**explanation:**"]
        .iter()
        .any(|marker| marker.starts_with(&lower))
}

/// Parse the accumulated response text.
pub fn parse(text: &str) -> ParseResult {
    let code = first_match(CODE_STRATEGIES, text);
    let explanation = explanation(text, code);

    let code_body = code.body();
    let leftover = if code_body.is_empty() {
        text.trim().to_string()
    } else {
        String::new()
    };

    let phase = match code {
        Match::Closed { .. } if explanation.terminated => Phase::Done,
        Match::Closed { .. } => Phase::AwaitingExplanation,
        _ => Phase::AwaitingCode,
    };

    ParseResult {
        code: code_body.to_string(),
        explanation: explanation.text.to_string(),
        leftover,
        phase,
    }
}
