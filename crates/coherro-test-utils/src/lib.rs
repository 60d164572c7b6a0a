// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Coherro integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a model API, renderer, ffmpeg
//! or object store.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock model provider with scripted replies
//! - [`StubRenderer`] / [`StubEncoder`] - Renderer and placeholder encoder stand-ins
//! - [`RecordingObjectStore`] - In-memory object store
//! - [`MemoryStorage`] - In-memory conversation and generation storage
//! - [`TestHarness`] - The full pipeline wired over the mocks

pub mod harness;
pub mod mock_provider;
pub mod mock_render;
pub mod mock_storage;
pub mod mock_store;

pub use harness::{TestHarness, collect_until_terminal};
pub use mock_provider::{MockProvider, MockReply};
pub use mock_render::{RenderBehavior, StubEncoder, StubRenderer};
pub use mock_storage::MemoryStorage;
pub use mock_store::RecordingObjectStore;
