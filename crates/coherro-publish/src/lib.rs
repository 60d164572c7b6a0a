// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for rendered videos.
//!
//! [`ArtifactPublisher`] uploads to an [`coherro_core::ObjectStore`] when one
//! is configured and otherwise keeps the file in a local directory.
//! [`S3ObjectStore`] is the bundled store, speaking the S3 REST API with
//! Signature V4 authentication.

pub mod publisher;
pub mod s3;

pub use publisher::ArtifactPublisher;
pub use s3::{S3ObjectStore, S3Settings};
