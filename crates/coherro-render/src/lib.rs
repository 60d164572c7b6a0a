// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Video rendering for generated scene code.
//!
//! [`RenderOrchestrator`] writes the code into a fresh workspace, runs the
//! primary [`SceneRenderer`], discovers its output through configured path
//! templates, and falls back to a [`MediaEncoder`] placeholder when anything
//! goes wrong.

pub mod candidates;
pub mod diagnostic;
pub mod encoder;
pub mod orchestrator;
pub mod renderer;
pub mod workspace;

pub use candidates::{CandidateContext, OutputCandidates, detect_scene_name};
pub use diagnostic::{FailureKind, RenderDiagnostic, RenderFailure};
pub use encoder::{FfmpegEncoder, MediaEncoder, PlaceholderSpec};
pub use orchestrator::{RenderArtifact, RenderLayout, RenderOrchestrator};
pub use renderer::{RenderRun, SceneJob, SceneRenderer, SubprocessRenderer};
pub use workspace::Workspace;
