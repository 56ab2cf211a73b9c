//! Test Helper Utilities
//!
//! Shared fixtures for songtag-ai integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_transport;
