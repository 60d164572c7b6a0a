// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns streamed model output into a code artifact and an explanation.
//!
//! Both halves are pure: [`parse`] maps the accumulated response text to a
//! [`ParseResult`], and [`sanitize`] cleans up the extracted fields once the
//! stream has ended.

pub mod parser;
pub mod sanitize;

pub use parser::{ParseResult, Phase, parse};
pub use sanitize::{TextKind, sanitize};
