//! Proc Client Library
//!
//! Typed wrapper around the proc wire protocol. A client owns one
//! connection (one session on the server) and therefore at most one open
//! file at a time.
//!
//! # Example
//!
//! ```ignore
//! use procfs_vfs::client::ProcClient;
//! use procfs_vfs::ipc::proc_msg::O_RDONLY;
//!
//! let mut proc = ProcClient::new(transport);
//! proc.open("/sys", O_RDONLY)?;
//! let text = proc.read_to_end()?;
//! proc.close()?;
//! ```

use alloc::vec::Vec;
use procfs_ipc::{info, IoHeader, IoOp, MSG_BUFFER_SIZE};

use crate::core::{DirEntry, VfsError};
use crate::ipc::decode_entries;

/// Request/reply transport to a proc server.
pub trait Transport {
    /// Send one request and wait for its reply.
    ///
    /// Returns the raw reply status and payload.
    fn send(&mut self, header: IoHeader, payload: &[u8]) -> Result<(i32, Vec<u8>), VfsError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, header: IoHeader, payload: &[u8]) -> Result<(i32, Vec<u8>), VfsError> {
        (**self).send(header, payload)
    }
}

/// Client for a single proc connection.
pub struct ProcClient<T: Transport> {
    transport: T,
    buffer_size: u32,
}

fn check(status: i32) -> Result<i32, VfsError> {
    match VfsError::from_status(status) {
        Some(err) => Err(err),
        None => Ok(status),
    }
}

fn path_payload(path: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(path.len() + 1);
    payload.extend_from_slice(path.as_bytes());
    payload.push(0);
    payload
}

impl<T: Transport> ProcClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buffer_size: MSG_BUFFER_SIZE as u32,
        }
    }

    /// Limit the reply size requested for reads and listings.
    pub fn with_buffer_size(mut self, buffer_size: u32) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    fn call(&mut self, op: IoOp, code: u32, payload: &[u8], rbytes: u32) -> Result<(i32, Vec<u8>), VfsError> {
        let header = IoHeader::new(op, code, payload.len() as u32, rbytes);
        let (status, reply) = self.transport.send(header, payload)?;
        Ok((check(status)?, reply))
    }

    /// Open `path` with `O_*` flags.
    pub fn open(&mut self, path: &str, flags: u32) -> Result<(), VfsError> {
        self.call(IoOp::Open, flags, &path_payload(path), 0).map(|_| ())
    }

    pub fn close(&mut self) -> Result<(), VfsError> {
        self.call(IoOp::Close, 0, &[], 0).map(|_| ())
    }

    /// Read up to `len` bytes at the cursor.
    pub fn read(&mut self, len: u32) -> Result<Vec<u8>, VfsError> {
        let (count, mut data) = self.call(IoOp::Read, 0, &[], len)?;
        data.truncate(count as usize);
        Ok(data)
    }

    /// Read from the cursor until the server returns nothing.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, VfsError> {
        let mut out = Vec::new();
        loop {
            let chunk = self.read(self.buffer_size)?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Write at the cursor. Returns the number of bytes the server accepted.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, VfsError> {
        let (count, _) = self.call(IoOp::Write, 0, bytes, 0)?;
        Ok(count as usize)
    }

    /// Move the cursor. Returns the new position.
    pub fn seek(&mut self, offset: i64, whence: u32) -> Result<u64, VfsError> {
        let (_, reply) = self.call(IoOp::Seek, whence, &offset.to_le_bytes(), 8)?;
        let bytes: [u8; 8] = reply
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| VfsError::protocol("seek reply too short"))?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn truncate(&mut self, size: u64) -> Result<(), VfsError> {
        self.call(IoOp::Truncate, 0, &size.to_le_bytes(), 0).map(|_| ())
    }

    pub fn share(&mut self) -> Result<(), VfsError> {
        self.call(IoOp::Share, 0, &[], 0).map(|_| ())
    }

    /// List a directory.
    pub fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let (_, reply) = self.call(IoOp::Info, info::INFO_LIST_ALL, &path_payload(path), self.buffer_size)?;
        decode_entries(&reply)
    }
}
