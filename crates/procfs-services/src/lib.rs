//! Proc Filesystem Server
//!
//! This crate provides the proc server and its entry point:
//!
//! - **ProcService**: connection table and request handlers over the
//!   namespace built from the boot image
//! - **ServerConfig**: JSON configuration with defaults
//! - **FileImage**: boot image source backed by a file on disk
//!
//! # Architecture
//!
//! The service implements `procfs_dispatch::ServerApp`; whatever drives it
//! (the single-worker `ServerRuntime`, a test) supplies the channel and the
//! sharing capability.
//!
//! The binary entry point in `src/bin/` only wires a config, an image file
//! and a local channel together.

extern crate alloc;

pub mod config;
pub mod services;
pub mod source;

#[cfg(test)]
pub mod test_utils;

// Re-export the framework types a driver needs
pub use procfs_dispatch::{
    AppError, Channel, Event, Message, Response, ServerApp, ServerContext, ServerRuntime,
    SessionId, ShareCapability,
};

pub use config::{ConfigError, ServerConfig};
pub use services::ProcService;
pub use source::FileImage;
