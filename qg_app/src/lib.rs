//! # qg_app
//!
//! Shared utilities for the quota-guard binaries

pub mod cli;
pub mod config_loader;
pub mod report;
pub mod shutdown_handler;
pub mod tracing_setup;
