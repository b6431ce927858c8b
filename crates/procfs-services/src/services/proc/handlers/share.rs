//! Share handler
//!
//! Handles: SHARE
//!
//! # Safety Properties
//!
//! - **Success**: exactly one live grant per mapped session, covering the
//!   file's current buffer
//! - **Failure**: a revoked stale grant is recorded before the new grant is
//!   attempted, so a failed re-share leaves nothing for Close to revoke
//! - **Forbidden**: granting a buffer of a file without the mappable flag

use procfs_dispatch::{Message, Response, ShareCapability, SharedRegion};
use procfs_vfs::{AccessFlags, VfsError};

use super::super::{ConnectionState, ProcService};
use super::connection_mut;

impl<S: ShareCapability> ProcService<S> {
    /// Handle SHARE - grant the session the bound file's buffer
    ///
    /// A second SHARE on a mapped connection is a no-op unless a truncate
    /// replaced the buffer since, in which case the old grant is revoked
    /// and a new one made.
    pub fn handle_share(&mut self, msg: &Message) -> Result<Response, VfsError> {
        let conn = connection_mut(&mut self.connections, msg.session)?;
        if conn.is_closed() {
            return Err(VfsError::InvalidState);
        }
        let (file, _) = conn.bound()?;

        let node = self.namespace.file(file)?;
        if !node.access().contains(AccessFlags::MAP) {
            return Err(VfsError::AccessDenied);
        }
        let generation = node.buffer_generation();

        match conn.state() {
            ConnectionState::Mapped { generation: Some(granted) } if granted == generation => {
                return Ok(Response::ok());
            }
            ConnectionState::Mapped { generation: Some(_) } => {
                if let Err(e) = self.share.unshare(msg.session) {
                    log::warn!("ProcService: revoking stale grant for {:?}: {}", msg.session, e);
                }
                conn.set_state(ConnectionState::Mapped { generation: None })?;
            }
            _ => {}
        }

        let region = SharedRegion {
            generation,
            data: node.data(),
        };
        self.share.share(msg.session, region).map_err(|e| {
            log::warn!("ProcService: share for {:?} failed: {}", msg.session, e);
            VfsError::ResourceExhausted
        })?;
        conn.set_state(ConnectionState::Mapped {
            generation: Some(generation),
        })?;

        log::debug!(
            "ProcService: {:?} mapped {} bytes (generation {})",
            msg.session,
            node.size(),
            generation
        );
        Ok(Response::ok())
    }
}
