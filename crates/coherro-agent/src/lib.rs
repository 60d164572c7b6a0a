// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation pipeline and session management for Coherro.
//!
//! The [`GenerationPipeline`] turns a prompt into a published video:
//! - persists the prompt and loads the project's conversation
//! - streams the model response through the incremental parser
//! - renders the sanitized code, with a placeholder fallback
//! - publishes the video and records its location
//!
//! A [`SessionController`] runs at most one pipeline per connected client and
//! speaks the [`events`] protocol.

pub mod events;
pub mod pipeline;
pub mod request;
pub mod session;
pub mod shutdown;

pub use events::{ClientMessage, EventSink, ServerEvent};
pub use pipeline::{AdapterHealth, GenerationPipeline, PipelineSettings};
pub use request::{FinishedResponse, GenerationRequest};
pub use session::{SessionController, client_message};
pub use shutdown::install_signal_handler;
