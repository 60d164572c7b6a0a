// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the pipeline's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod object_store;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use object_store::ObjectStore;
pub use provider::{DeltaStream, ProviderAdapter};
pub use storage::StorageAdapter;
