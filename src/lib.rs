//! Questboard library
//!
//! Content relationship and identity engine for quest-based collaboration:
//! attachment rules, hierarchical node ids, self-healing task graphs and
//! computed discovery boards, plus the storage and service layers around them.

pub mod boards;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod relations;
pub mod repo;
pub mod service;
pub mod tags;
pub mod types;
