//! # Castle Tools
//!
//! Command-line tooling around the castle engine:
//! - Seeded skirmishes with JSON-lines battle output
//! - Parallel balance batches
//! - Snapshot and replay inspection
//! - Rules file validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod error;
pub mod inspect;
pub mod skirmish;
pub mod validate;

pub use error::{Result, ToolError};
