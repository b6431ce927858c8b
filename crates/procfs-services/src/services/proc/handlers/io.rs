//! Cursor I/O handlers
//!
//! Handles: READ, WRITE, SEEK, TRUNCATE
//!
//! All four need an open connection. READ and WRITE move the cursor by the
//! number of bytes transferred; neither one changes the file's size.

use alloc::format;
use procfs_dispatch::{Message, Response, ShareCapability};
use procfs_vfs::proc_msg::{SEEK_CUR, SEEK_END, SEEK_SET};
use procfs_vfs::VfsError;

use super::super::ProcService;
use super::connection_mut;

impl<S: ShareCapability> ProcService<S> {
    /// Handle READ - copy up to `rbytes` bytes from the cursor
    ///
    /// Replies with zero bytes once the cursor is at or past the end.
    pub fn handle_read(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        let (file, mode) = conn.bound()?;
        if !mode.can_read() {
            return Err(VfsError::AccessDenied);
        }

        let max = (msg.header.rbytes as usize).min(i32::MAX as usize);
        let data = self.namespace.read_at(file, conn.seek(), max)?;
        let count = data.len();
        let payload = data.to_vec();
        conn.advance(count);

        Ok(Response {
            status: count as i32,
            payload,
        })
    }

    /// Handle WRITE - overwrite bytes at the cursor
    ///
    /// Stops at the end of the buffer; growing a file takes a TRUNCATE.
    pub fn handle_write(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        let (file, mode) = conn.bound()?;
        if !mode.can_write() {
            return Err(VfsError::AccessDenied);
        }

        let count = self.namespace.write_at(file, conn.seek(), &msg.payload)?;
        conn.advance(count);
        Ok(Response::with_status(count as i32))
    }

    /// Handle SEEK - move the cursor
    ///
    /// `code` is the whence; the payload is an `i64` offset. The cursor may
    /// land past the end of the file but never before its start. Replies
    /// with the new position as a `u64`.
    pub fn handle_seek(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        let (file, _) = conn.bound()?;
        let offset = seek_offset(&msg.payload)?;

        let base = match msg.header.code {
            SEEK_SET => 0,
            SEEK_CUR => i128::from(conn.seek()),
            SEEK_END => self.namespace.file(file)?.size() as i128,
            other => {
                return Err(VfsError::invalid_argument(format!(
                    "unknown seek mode {}",
                    other
                )))
            }
        };
        let target = u64::try_from(base + i128::from(offset))
            .map_err(|_| VfsError::invalid_argument("seek out of range"))?;

        conn.set_seek(target);
        Ok(Response::ok_with(target.to_le_bytes().to_vec()))
    }

    /// Handle TRUNCATE - resize the bound file's buffer
    ///
    /// The new size is rounded up to the page size. A grant made before
    /// the resize covers the old buffer; the client has to SHARE again.
    pub fn handle_truncate(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        let (file, _) = conn.bound()?;
        let size = truncate_size(&msg.payload)?;
        if size > self.config.max_file_size {
            log::warn!(
                "ProcService: truncate to {} exceeds limit {}",
                size,
                self.config.max_file_size
            );
            return Err(VfsError::ResourceExhausted);
        }

        let new_len = self.namespace.truncate(file, size)?;
        if conn.is_granted() {
            log::debug!(
                "ProcService: {:?} grant is stale after truncate to {}",
                msg.session,
                new_len
            );
        }
        Ok(Response::ok())
    }
}

fn seek_offset(payload: &[u8]) -> Result<i64, VfsError> {
    let bytes: [u8; 8] = payload
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| VfsError::invalid_argument("seek payload must hold an i64"))?;
    Ok(i64::from_le_bytes(bytes))
}

/// New size from a truncate payload: a `u32` or a `u64`.
fn truncate_size(payload: &[u8]) -> Result<u64, VfsError> {
    match payload.len() {
        4 => {
            let mut b = [0u8; 4];
            b.copy_from_slice(payload);
            Ok(u64::from(u32::from_le_bytes(b)))
        }
        8 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(payload);
            Ok(u64::from_le_bytes(b))
        }
        n => Err(VfsError::invalid_argument(format!(
            "truncate payload of {} bytes",
            n
        ))),
    }
}
