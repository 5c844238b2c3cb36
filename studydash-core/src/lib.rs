//! # studydash-core
//!
//! Core library for studydash - a personal study tracker.
//!
//! This library provides:
//! - Domain types for the syllabus tree, study sessions and planner
//! - Study analytics computed from session and syllabus snapshots
//! - Database storage layer with SQLite
//! - Focus timer state machine
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! The store owns three aggregates (session log, syllabus tree, planner
//! state) and hands out owned snapshots. Analytics are pure functions over
//! those snapshots and are recomputed from scratch on every read.
//!
//! ## Example
//!
//! ```rust,no_run
//! use studydash_core::{analytics::StudyReport, Config, Database, SessionFilter};
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let sessions = db.list_sessions(&SessionFilter::default()).expect("sessions");
//! let subjects = db.load_subjects().expect("subjects");
//! let report = StudyReport::compute(&sessions, &subjects, &chrono::Local::now());
//! println!("consistency: {}%", report.consistency);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, SessionFilter};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod planner;
pub mod seed;
pub mod timer;
pub mod types;
