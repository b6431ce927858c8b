//! Proc Server Dispatch Framework
//!
//! Core types and traits for building a message-driven server:
//!
//! - **ServerApp**: The trait a server implements (attach, detach, io)
//! - **Channel**: Where events come from and replies go
//! - **ShareCapability**: Grants a session direct access to a buffer
//! - **ServerRuntime**: Single-worker loop driving a `ServerApp`
//! - **local** (`std`): In-process channel and client over `std::sync::mpsc`
//!
//! # Dispatch Model
//!
//! ```text
//!  Client ──Attach──►┐
//!  Client ──Io──────►├──► Channel::receive ──► ServerRuntime ──► ServerApp
//!  Client ──Detach──►┘                              │
//!                                                   ▼
//!  Client ◄──────────── Channel::reply ◄──── Response (exactly one per Io)
//! ```

#![no_std]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod app;
mod error;
mod runtime;

#[cfg(feature = "std")]
pub mod local;

pub use app::{
    Channel, Event, Message, ReceiveId, Response, ServerApp, ServerContext, SessionId,
    ShareCapability, SharedRegion,
};
pub use error::{AppError, ProtocolError};
pub use runtime::{RuntimeStats, ServerRuntime};
