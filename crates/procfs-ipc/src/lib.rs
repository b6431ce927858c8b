//! Wire Protocol Constants for the Proc Filesystem
//!
//! This crate defines:
//! - **I/O operation codes** carried in every request header
//! - **Status codes** returned in every reply
//! - **Open flags**, **seek modes** and **listing tags**
//! - The fixed-size request header and its little-endian codec
//!
//! It is the **single source of truth** for values shared between the
//! proc server and its clients.
//!
//! # Request Layout
//!
//! | Offset | Size | Field    | Meaning                                |
//! |--------|------|----------|----------------------------------------|
//! | 0      | 4    | `op`     | Operation code ([`IoOp`])              |
//! | 4      | 4    | `code`   | Operation-specific code (flags, mode)  |
//! | 8      | 4    | `sbytes` | Bytes of request payload that follow   |
//! | 12     | 4    | `rbytes` | Maximum reply payload the client takes |
//!
//! # Status Codes
//!
//! Zero means success. For `READ`/`WRITE` the status is the byte count
//! transferred; all failures are negative.
//!
//! # Usage
//!
//! ```rust
//! use procfs_ipc::{IoHeader, IoOp, open};
//!
//! let hdr = IoHeader::new(IoOp::Open, open::O_RDWR | open::O_CREAT, 6, 0);
//! let bytes = hdr.encode();
//! assert_eq!(IoHeader::decode(&bytes), Some(hdr));
//! ```

#![no_std]

// =============================================================================
// I/O Operations
// =============================================================================

/// Operation codes understood by the proc server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum IoOp {
    /// Directory listing (`code` selects the listing kind)
    Info = 1,
    /// Read from the bound file at the seek cursor
    Read = 2,
    /// Write to the bound file at the seek cursor
    Write = 3,
    /// Bind a file to the connection
    Open = 4,
    /// Release the bound file
    Close = 5,
    /// Grant the client zero-copy access to the file buffer
    Share = 6,
    /// Move the seek cursor
    Seek = 7,
    /// Resize the bound file's buffer
    Truncate = 8,
}

impl IoOp {
    /// Convert from the raw header value.
    ///
    /// Returns `None` for unknown operations.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(IoOp::Info),
            2 => Some(IoOp::Read),
            3 => Some(IoOp::Write),
            4 => Some(IoOp::Open),
            5 => Some(IoOp::Close),
            6 => Some(IoOp::Share),
            7 => Some(IoOp::Seek),
            8 => Some(IoOp::Truncate),
            _ => None,
        }
    }

    /// Get human-readable display name.
    pub fn name(&self) -> &'static str {
        match self {
            IoOp::Info => "INFO",
            IoOp::Read => "READ",
            IoOp::Write => "WRITE",
            IoOp::Open => "OPEN",
            IoOp::Close => "CLOSE",
            IoOp::Share => "SHARE",
            IoOp::Seek => "SEEK",
            IoOp::Truncate => "TRUNCATE",
        }
    }
}

// =============================================================================
// Status Codes
// =============================================================================

/// Reply status codes.
pub mod status {
    /// Success
    pub const E_OK: i32 = 0;
    /// Generic failure
    pub const E_ERROR: i32 = -1;
    /// Malformed argument (path, seek mode, size)
    pub const E_INVAL: i32 = -2;
    /// Named resource does not exist
    pub const E_NO_RES: i32 = -3;
    /// Resource already in use
    pub const E_BUSY: i32 = -4;
    /// Access mode not permitted
    pub const E_ACCESS: i32 = -5;
    /// Allocation or mapping failed
    pub const E_NO_MEM: i32 = -6;
    /// Operation not valid in the connection's current state
    pub const E_STATE: i32 = -7;
}

pub use status::*;

// =============================================================================
// Open Flags
// =============================================================================

/// Flags carried in the `code` field of an `OPEN` request.
pub mod open {
    /// Read only
    pub const O_RDONLY: u32 = 0x0;
    /// Write only
    pub const O_WRONLY: u32 = 0x1;
    /// Read and write
    pub const O_RDWR: u32 = 0x2;
    /// Mask selecting the access mode bits
    pub const O_ACCMODE: u32 = 0x3;
    /// Create the file when it does not exist
    pub const O_CREAT: u32 = 0x10;
}

// =============================================================================
// Seek Modes
// =============================================================================

/// Modes carried in the `code` field of a `SEEK` request.
///
/// The payload is a little-endian `i64` offset; the reply payload is the
/// resulting cursor as a little-endian `u64`.
pub mod seek {
    /// Absolute offset
    pub const SEEK_SET: u32 = 0;
    /// Relative to the current cursor
    pub const SEEK_CUR: u32 = 1;
    /// Relative to the end of the file
    pub const SEEK_END: u32 = 2;
}

// =============================================================================
// Listing
// =============================================================================

/// Listing codes and entry tags for `INFO` requests.
///
/// Entry layout: `tag: u32`, `size: u64` (files only), `len: u16`,
/// `name: [u8; len]`, `0u8`. All integers little-endian.
pub mod info {
    /// List every directory then every file under the given path
    pub const INFO_LIST_ALL: u32 = 0x1;
    /// Entry tag for a directory
    pub const INFO_DIR: u32 = 0x1;
    /// Entry tag for a file
    pub const INFO_FILE: u32 = 0x2;
}

// =============================================================================
// Server Defaults
// =============================================================================

/// Path the proc server registers under.
pub const SERVER_PATH: &str = "/proc";

/// Size of the message buffer the server receives into.
pub const MSG_BUFFER_SIZE: usize = 2048;

/// Page size used to round truncated buffers.
pub const PAGE_SIZE: usize = 4096;

/// Longest name a single directory or file may carry.
pub const MAX_NAME_LEN: usize = 255;

// =============================================================================
// Request Header
// =============================================================================

/// Fixed header preceding every request payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoHeader {
    /// Raw operation code (see [`IoOp`])
    pub op: u32,
    /// Operation-specific code
    pub code: u32,
    /// Request payload length
    pub sbytes: u32,
    /// Maximum reply payload length
    pub rbytes: u32,
}

impl IoHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;

    /// Build a header for a known operation.
    pub fn new(op: IoOp, code: u32, sbytes: u32, rbytes: u32) -> Self {
        Self {
            op: op as u32,
            code,
            sbytes,
            rbytes,
        }
    }

    /// Decoded operation, if known.
    pub fn operation(&self) -> Option<IoOp> {
        IoOp::from_u32(self.op)
    }

    /// Encode as 16 little-endian bytes.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.op.to_le_bytes());
        buf[4..8].copy_from_slice(&self.code.to_le_bytes());
        buf[8..12].copy_from_slice(&self.sbytes.to_le_bytes());
        buf[12..16].copy_from_slice(&self.rbytes.to_le_bytes());
        buf
    }

    /// Decode from the start of `buf`.
    ///
    /// Returns `None` if fewer than [`IoHeader::SIZE`] bytes are available.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        let word = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Some(Self {
            op: word(0),
            code: word(4),
            sbytes: word(8),
            rbytes: word(12),
        })
    }
}
