// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for Coherro.
//!
//! Exposes the generation pipeline over:
//! - `GET /ws` - one session per WebSocket connection, streaming progress events
//! - `POST /v1/prompt` - a single non-streaming generation
//! - `GET /health`

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{GatewayState, ServerConfig, router, start_server};
