//! Operation handlers for ProcService
//!
//! Each handler returns the reply for one request; the caller turns an
//! `Err` into its status code. Handlers never reply themselves.

mod io;
mod list;
mod open;
mod share;

use procfs_dispatch::{Message, SessionId};
use procfs_vfs::core::path_from_payload;
use procfs_vfs::VfsError;

use super::connection::{Connection, ConnectionTable};

/// Connection for a request's session.
///
/// The runtime only delivers requests from attached sessions, so a miss
/// means the table and the channel disagree.
pub(crate) fn connection_mut(
    table: &mut ConnectionTable,
    session: SessionId,
) -> Result<&mut Connection, VfsError> {
    table
        .get_mut(session)
        .ok_or_else(|| VfsError::protocol(alloc::format!("no connection for {:?}", session)))
}

/// Absolute path carried by a request payload.
///
/// Requests have no working directory, so a relative path is refused
/// with `InvalidPath`.
pub(crate) fn request_path(msg: &Message) -> Result<&str, VfsError> {
    let path = path_from_payload(&msg.payload)?;
    if !path.starts_with('/') {
        return Err(VfsError::invalid_path(alloc::format!("'{}' is not absolute", path)));
    }
    Ok(path)
}
