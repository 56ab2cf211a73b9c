//! # songtag Common Library
//!
//! Shared code for the songtag workspace:
//! - Error type and result alias
//! - TOML/environment configuration loading
//! - Logging initialisation (console + appended log file)

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
