// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Coherro.
//!
//! Stores each project's conversation turns and the generation records
//! produced from them. WAL-mode SQLite with embedded migrations; all access
//! goes through `tokio-rusqlite`'s single background thread.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
