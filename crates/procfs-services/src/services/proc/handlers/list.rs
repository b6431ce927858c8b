//! List handler
//!
//! Handles: INFO (`INFO_LIST_ALL` only)

use alloc::format;
use procfs_dispatch::{Message, Response, ShareCapability};
use procfs_vfs::ipc::encode_entries;
use procfs_vfs::proc_msg::INFO_LIST_ALL;
use procfs_vfs::VfsError;

use super::super::ProcService;
use super::{connection_mut, request_path};

impl<S: ShareCapability> ProcService<S> {
    /// Handle INFO - list the directory named by the payload
    ///
    /// Directories come first, then files. Only whole entries that fit in
    /// `rbytes` are returned. Any path that is not exactly an existing
    /// directory is `InvalidPath`.
    pub fn handle_list(&mut self, msg: &Message) -> Result<Response, VfsError> {
        connection_mut(&mut self.connections, msg.session)?;
        if msg.header.code != INFO_LIST_ALL {
            return Err(VfsError::invalid_argument(format!(
                "unsupported info code {:#x}",
                msg.header.code
            )));
        }

        let path = request_path(msg)?;
        let dir = self.namespace.lookup_dir(None, path)?;
        let entries = self.namespace.entries(dir)?;

        let limit = (msg.header.rbytes as usize).min(self.config.buffer_size);
        let reply = encode_entries(&entries, limit);
        log::trace!(
            "ProcService: list {} -> {} entries, {} bytes",
            path,
            entries.len(),
            reply.len()
        );
        Ok(Response::ok_with(reply))
    }
}
