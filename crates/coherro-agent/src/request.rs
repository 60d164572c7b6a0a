// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight state of one prompt submission.

use coherro_core::CoherroError;
use coherro_parser::{ParseResult, TextKind, parse, sanitize};

/// Ephemeral state of a generation request, from prompt arrival to its
/// terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub project_id: String,
    pub accumulated_text: String,
    pub extracted_code: String,
    pub extracted_explanation: String,
    pub last_emitted_explanation: String,
}

impl GenerationRequest {
    /// Validate the inbound fields and start a request.
    pub fn new(prompt: &str, project_id: &str) -> Result<Self, CoherroError> {
        let prompt_text = prompt.trim();
        let project_id = project_id.trim();
        if prompt_text.is_empty() {
            return Err(CoherroError::Protocol("prompt must not be empty".into()));
        }
        if project_id.is_empty() {
            return Err(CoherroError::Protocol("projectId is required".into()));
        }
        Ok(Self {
            prompt_text: prompt_text.to_string(),
            project_id: project_id.to_string(),
            accumulated_text: String::new(),
            extracted_code: String::new(),
            extracted_explanation: String::new(),
            last_emitted_explanation: String::new(),
        })
    }

    /// Append a model delta and re-parse the whole response.
    ///
    /// Returns the explanation to emit when it is non-empty and differs from
    /// the last one emitted.
    pub fn push_delta(&mut self, delta: &str) -> Option<String> {
        self.accumulated_text.push_str(delta);
        let parsed = parse(&self.accumulated_text);
        self.extracted_code = parsed.code;
        self.extracted_explanation = parsed.explanation;

        if self.extracted_explanation.is_empty()
            || self.extracted_explanation == self.last_emitted_explanation
        {
            return None;
        }
        self.last_emitted_explanation = self.extracted_explanation.clone();
        Some(self.extracted_explanation.clone())
    }

    /// Final parse of the full response with both fields sanitized.
    pub fn finish(&self) -> FinishedResponse {
        let parsed = parse(&self.accumulated_text);
        FinishedResponse {
            code: sanitize(TextKind::Code, &parsed.code),
            explanation: sanitize(TextKind::Explanation, &parsed.explanation),
            full_text: parsed.full_text(),
            parsed,
        }
    }
}

/// Sanitized result of a completed model stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedResponse {
    pub code: String,
    pub explanation: String,
    pub full_text: String,
    pub parsed: ParseResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(matches!(
            GenerationRequest::new("   ", "p1"),
            Err(CoherroError::Protocol(_))
        ));
    }

    #[test]
    fn missing_project_is_rejected() {
        assert!(matches!(
            GenerationRequest::new("draw", ""),
            Err(CoherroError::Protocol(_))
        ));
    }

    #[test]
    fn explanation_is_emitted_once_per_change() {
        let mut req = GenerationRequest::new("draw a circle", "p1").unwrap();
        let deltas = [
            "<code>from manim import *\n",
            "class A(Scene): pass</code>\n",
            "<explanation>Draws",
            " a circle.</explanation>",
            "\n",
        ];
        let emitted: Vec<String> = deltas.iter().filter_map(|d| req.push_delta(d)).collect();
        assert_eq!(emitted, ["Draws a circle."]);
        assert_eq!(req.extracted_code, "from manim import *\nclass A(Scene): pass");
    }

    #[test]
    fn untagged_tail_streams_growing_explanation() {
        let mut req = GenerationRequest::new("p", "proj").unwrap();
        assert_eq!(req.push_delta("<code>x</code>\n"), None);
        assert_eq!(req.push_delta("Moves"), Some("Moves".into()));
        assert_eq!(req.push_delta(" right."), Some("Moves right.".into()));
        assert_eq!(req.push_delta(""), None);
    }

    #[test]
    fn finish_sanitizes_fields() {
        let mut req = GenerationRequest::new("p", "proj").unwrap();
        req.push_delta("```python\nx = 1\n```\n**Explanation:** Sets x.");
        let done = req.finish();
        assert_eq!(done.code, "x = 1");
        assert_eq!(done.explanation, "Sets x.");
    }

    #[test]
    fn finish_without_code_keeps_leftover_in_full_text() {
        let mut req = GenerationRequest::new("p", "proj").unwrap();
        req.push_delta("I cannot draw that.");
        let done = req.finish();
        assert_eq!(done.code, "");
        assert_eq!(done.parsed.leftover, "I cannot draw that.");
        assert!(done.full_text.contains("I cannot draw that."));
    }
}
