//! Leadboard - A command-line client for a sales-lead pipeline
//!
//! This library provides the core functionality for Leadboard, including:
//! - Data models for leads, stages, the kanban board and statistics
//! - The kanban store with optimistic stage transitions and rollback
//! - The lead service client (REST over HTTP)
//! - Configuration loading (rc file, environment, flags)
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use leadboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod config;
pub mod models;
pub mod kanban;
pub mod service;
pub mod cli;
pub mod utils;
