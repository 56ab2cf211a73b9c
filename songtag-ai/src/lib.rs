//! songtag-ai library interface
//!
//! Exposes the pipeline pieces for the binary and for integration testing.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::{Backend, CliArgs, RunConfig};
pub use crate::error::{ProcessError, RunError, RunResult};
