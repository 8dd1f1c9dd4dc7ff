//! Voice journal backend: transcription, event extraction, streaks and
//! achievements over a local SQLite store.
//!
//! A client records a voice note, the [`ai`] gateway transcribes it and pulls
//! out dated events, and every change to a user's counters is followed by an
//! achievement pass that unlocks milestones at most once per user.
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, tokens and health checks
//! - [`achievements`]: catalog types, the pure evaluation engine, persistence and the unlock pass
//! - [`diary`]: entries, events, reminders, stats upkeep and calendar views
//! - [`ai`]: chat-completions client, prompts and reply parsing
//! - [`api`]: axum router and handlers
//! - [`tools`]: MCP tools over stdio

pub mod achievements;
pub mod ai;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod diary;
pub mod server;
pub mod tools;
