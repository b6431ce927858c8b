//! Error types for the namespace layer.
//!
//! Every variant maps onto exactly one wire status code so handlers can
//! reply without a lookup table of their own.

use alloc::string::String;
use procfs_ipc::status;
use serde::{Deserialize, Serialize};

/// Errors from namespace and connection operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VfsError {
    /// Malformed argument (seek mode, size, payload)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed path, or path naming the wrong kind of node
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Named file or directory does not exist
    #[error("not found")]
    NotFound,

    /// Resource already attached, open, or referenced
    #[error("resource busy")]
    Busy,

    /// Requested mode not permitted by the file's access flags
    #[error("access denied")]
    AccessDenied,

    /// Allocation failed or a size limit was hit
    #[error("resource exhausted")]
    ResourceExhausted,

    /// Operation attempted in the wrong connection state
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Illegal connection state transition
    #[error("invalid state transition")]
    InvalidState,
}

impl VfsError {
    /// Create an invalid argument error with message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid path error with message.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a protocol error with message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolError(msg.into())
    }

    /// Wire status code for this error.
    pub fn status(&self) -> i32 {
        match self {
            VfsError::InvalidArgument(_) | VfsError::InvalidPath(_) => status::E_INVAL,
            VfsError::NotFound => status::E_NO_RES,
            VfsError::Busy => status::E_BUSY,
            VfsError::AccessDenied => status::E_ACCESS,
            VfsError::ResourceExhausted => status::E_NO_MEM,
            VfsError::ProtocolError(_) => status::E_ERROR,
            VfsError::InvalidState => status::E_STATE,
        }
    }

    /// Rebuild an error from a non-success reply status.
    ///
    /// Returns `None` for `E_OK` and for positive byte counts.
    pub fn from_status(code: i32) -> Option<Self> {
        match code {
            c if c >= status::E_OK => None,
            status::E_INVAL => Some(VfsError::InvalidArgument(String::new())),
            status::E_NO_RES => Some(VfsError::NotFound),
            status::E_BUSY => Some(VfsError::Busy),
            status::E_ACCESS => Some(VfsError::AccessDenied),
            status::E_NO_MEM => Some(VfsError::ResourceExhausted),
            status::E_STATE => Some(VfsError::InvalidState),
            _ => Some(VfsError::ProtocolError(String::new())),
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound)
    }
}
