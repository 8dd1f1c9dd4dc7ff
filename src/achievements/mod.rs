//! Streak and milestone achievements.
//!
//! [`engine`] holds the pure rules, [`store`] reads the catalog, unlocks and
//! stats from SQLite, and [`tracker`] runs the evaluate → persist → notify pass
//! that handlers call after anything that moves a counter.

pub mod engine;
pub mod store;
pub mod tracker;
pub mod types;
