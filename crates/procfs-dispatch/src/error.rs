//! Error Types for Proc Servers
//!
//! Defines errors that can occur while running a server.

use alloc::string::String;

/// Errors that can occur in server execution.
#[derive(Clone, Debug, thiserror::Error)]
pub enum AppError {
    /// Initialization failed with the given reason.
    #[error("initialization failed: {0}")]
    InitFailed(String),

    /// IPC communication failed.
    #[error("IPC error: {0}")]
    IpcError(String),

    /// Protocol parsing or validation failed.
    #[error("protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),

    /// A sharing grant could not be made or revoked.
    #[error("share failed: {0}")]
    ShareFailed(String),

    /// A namespace operation failed.
    #[error("VFS error: {0}")]
    Vfs(#[from] procfs_vfs::VfsError),

    /// An internal server error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors in an inbound request's framing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Header declares more payload than arrived.
    #[error("payload overflow: declared {declared} bytes, only {available} available")]
    PayloadOverflow { declared: usize, available: usize },

    /// Payload exceeds the server's message buffer.
    #[error("payload of {size} bytes exceeds buffer of {limit}")]
    BufferOverflow { size: usize, limit: usize },

    /// Operation code is not recognized.
    #[error("unknown operation: {0:#x}")]
    UnknownOperation(u32),
}
