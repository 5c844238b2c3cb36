//! Database layer for studydash
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository methods for the syllabus tree, session log and planner
//! - Owned snapshots handed to analytics

pub mod repo;
pub mod schema;

pub use repo::{Database, SessionFilter};
