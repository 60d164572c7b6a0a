// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in system instruction and its configured overrides.

use tracing::{info, warn};

/// Default instruction: asks for a Manim scene wrapped in the markers the
/// response parser looks for.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Coherro, an assistant that turns descriptions into short animations written with the Manim Community Python library.

Answer every request with exactly two parts, in this order:

<code>
from manim import *

class CircleScene(Scene):
    def construct(self):
        circle = Circle(color=BLUE)
        self.play(Create(circle))
        self.wait(1)
</code>
<explanation>
One or two short paragraphs describing what the animation shows.
</explanation>

Rules for the code:
- Wrap it in <code> and </code>. Do not use markdown code fences.
- Write one complete, runnable file that starts with `from manim import *`.
- Define exactly one class that subclasses Scene and implements construct().
- Use only built-in Manim objects. Do not use LaTeX (Tex, MathTex) or external files.
- Keep the animation under ten seconds.

Rules for the explanation:
- Wrap it in <explanation> and </explanation>.
- Plain prose, no code.

When the user asks for a change, reply with the complete updated file, not a diff."#;

/// Loads the system prompt following priority: file > inline > default.
pub async fn load_system_prompt(inline_prompt: &Option<String>, prompt_file: &Option<String>) -> String {
    if let Some(file_path) = prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    info!(path = file_path, "loaded system prompt from file");
                    return trimmed.to_string();
                }
                warn!(path = file_path, "system prompt file is empty, falling back");
            }
            Err(e) => {
                warn!(
                    path = file_path,
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(prompt) = inline_prompt
        && !prompt.trim().is_empty()
    {
        return prompt.clone();
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}
