//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the lecture archiver:
//! - Logging and tracing infrastructure
//! - Archive configuration with fail-fast validation
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the explicit configuration
//! value passed to every component at construction.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ArchiveConfig, ArchiveConfigBuilder};
pub use error::{Error, Result};
