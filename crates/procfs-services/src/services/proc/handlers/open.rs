//! Open and close handlers
//!
//! Handles: OPEN, CLOSE
//!
//! # Safety Properties
//!
//! - **Success**: file referenced once, bound to the session, cursor at 0
//! - **Acceptable partial failure**: a file created by `O_CREAT` stays in
//!   the tree even if the open that created it fails later
//! - **Forbidden**: a file reference without a bound connection

use alloc::vec::Vec;
use procfs_dispatch::{Message, Response, ShareCapability};
use procfs_vfs::proc_msg::O_CREAT;
use procfs_vfs::{AccessFlags, OpenMode, VfsError};

use super::super::{ProcService, Releaser};
use super::{connection_mut, request_path};

impl<S: ShareCapability> ProcService<S> {
    /// Handle OPEN - bind a file to the session
    ///
    /// The low two bits of `code` select the access mode; `O_CREAT`
    /// creates a missing file (and its parent directories) empty and
    /// read/write/mappable.
    pub fn handle_open(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        if conn.file().is_some() || !conn.is_closed() {
            return Err(VfsError::Busy);
        }

        let code = msg.header.code;
        let mode = OpenMode::from_flags(code)?;
        let path = request_path(msg)?;

        let file = match self.namespace.get_file(None, path) {
            Some(id) => id,
            None if code & O_CREAT != 0 => {
                let id = self
                    .namespace
                    .create_file(None, path, Vec::new(), AccessFlags::created())?;
                log::debug!("ProcService: created {}", path);
                id
            }
            None => return Err(VfsError::NotFound),
        };

        self.namespace.open_file(file, mode)?;
        if let Err(e) = conn.bind(file, mode) {
            self.namespace.close_file(file)?;
            return Err(e);
        }
        log::debug!("ProcService: {:?} opened {} {:?}", msg.session, path, mode);
        Ok(Response::ok())
    }

    /// Handle CLOSE - release the bound file
    ///
    /// Revokes the grant if mapped and drops the file reference. Closing a
    /// closed connection does nothing; this never fails.
    pub fn handle_close(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let mut releaser = Releaser {
            namespace: &mut self.namespace,
            share: &mut self.share,
        };
        if let Err(e) = self.connections.close(msg.session, &mut releaser) {
            log::debug!("ProcService: close for {:?}: {}", msg.session, e);
        }
        Ok(Response::ok())
    }
}
