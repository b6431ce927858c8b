//! Proc Filesystem Services
//!
//! # Services
//!
//! - **proc**: the in-memory namespace server registered at `/proc`

pub mod proc;

pub use proc::ProcService;
