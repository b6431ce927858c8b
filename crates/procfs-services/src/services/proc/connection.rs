//! Connection Table
//!
//! One [`Connection`] per attached session, keyed by [`SessionId`].
//!
//! ```text
//!            open               share
//!  CLOSED ─────────► OPEN ─────────────► MAPPED
//!     ▲                │                    │
//!     └──── close ─────┴────── close ───────┘
//! ```
//!
//! There is no MAPPED → OPEN edge: a grant is only revoked by Close or by
//! detach, both of which go through [`CloseConnection`], or when a truncate
//! has made it stale. A MAPPED connection whose stale grant was revoked but
//! not replaced carries no generation until the next successful SHARE.

use alloc::collections::BTreeMap;
use procfs_dispatch::SessionId;
use procfs_vfs::{FileId, OpenMode, VfsError};

/// Lifecycle state of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
    /// Shared; `generation` is the buffer generation the live grant covers,
    /// `None` when no grant is held
    Mapped { generation: Option<u32> },
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Open => "open",
            ConnectionState::Mapped { .. } => "mapped",
        }
    }

    /// Whether moving from `self` to `next` is a legal edge.
    pub fn allows(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (_, Closed) => true,
            (Closed, Open) => true,
            (Open, Mapped { .. }) | (Mapped { .. }, Mapped { .. }) => true,
            _ => false,
        }
    }
}

/// Server-side state of one client session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    session: SessionId,
    state: ConnectionState,
    access: Option<OpenMode>,
    seek: u64,
    file: Option<FileId>,
}

impl Connection {
    fn new(session: SessionId) -> Self {
        Self {
            session,
            state: ConnectionState::Closed,
            access: None,
            seek: 0,
            file: None,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn access(&self) -> Option<OpenMode> {
        self.access
    }

    pub fn seek(&self) -> u64 {
        self.seek
    }

    pub fn set_seek(&mut self, seek: u64) {
        self.seek = seek;
    }

    /// Move the cursor forward by `n` bytes.
    pub fn advance(&mut self, n: usize) {
        self.seek = self.seek.saturating_add(n as u64);
    }

    pub fn file(&self) -> Option<FileId> {
        self.file
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Whether the sharing capability holds a grant for this session.
    pub fn is_granted(&self) -> bool {
        matches!(self.state, ConnectionState::Mapped { generation: Some(_) })
    }

    /// Change state, refusing edges the state machine does not have.
    pub fn set_state(&mut self, next: ConnectionState) -> Result<(), VfsError> {
        if !self.state.allows(next) {
            log::debug!(
                "Connection: {:?} refused {} -> {}",
                self.session,
                self.state.name(),
                next.name()
            );
            return Err(VfsError::InvalidState);
        }
        self.state = next;
        Ok(())
    }

    /// File and mode of an open connection.
    pub fn bound(&self) -> Result<(FileId, OpenMode), VfsError> {
        match (self.state, self.file, self.access) {
            (ConnectionState::Closed, _, _) => Err(VfsError::protocol("connection is not open")),
            (_, Some(file), Some(mode)) => Ok((file, mode)),
            _ => Err(VfsError::protocol("connection has no bound file")),
        }
    }

    /// Bind an opened file. Only legal while closed.
    pub fn bind(&mut self, file: FileId, mode: OpenMode) -> Result<(), VfsError> {
        if self.file.is_some() || !self.is_closed() {
            return Err(VfsError::Busy);
        }
        self.set_state(ConnectionState::Open)?;
        self.file = Some(file);
        self.access = Some(mode);
        self.seek = 0;
        Ok(())
    }

    /// Back to the freshly attached state. Returns the file that was bound.
    pub fn reset(&mut self) -> Option<FileId> {
        self.state = ConnectionState::Closed;
        self.access = None;
        self.seek = 0;
        self.file.take()
    }
}

/// Releases whatever a connection holds.
///
/// Called by [`ConnectionTable::detach`] and [`ConnectionTable::close`] on
/// every connection they tear down, open or not.
pub trait CloseConnection {
    fn close_connection(&mut self, conn: &mut Connection);
}

/// All live connections.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    connections: BTreeMap<SessionId, Connection>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a closed connection for a new session.
    pub fn attach(&mut self, session: SessionId) -> Result<&mut Connection, VfsError> {
        if self.connections.contains_key(&session) {
            return Err(VfsError::Busy);
        }
        Ok(self
            .connections
            .entry(session)
            .or_insert_with(|| Connection::new(session)))
    }

    /// Remove a session, releasing its resources first.
    pub fn detach(
        &mut self,
        session: SessionId,
        closer: &mut dyn CloseConnection,
    ) -> Result<(), VfsError> {
        let mut conn = self.connections.remove(&session).ok_or(VfsError::NotFound)?;
        closer.close_connection(&mut conn);
        Ok(())
    }

    /// Release a session's resources and return it to CLOSED.
    pub fn close(
        &mut self,
        session: SessionId,
        closer: &mut dyn CloseConnection,
    ) -> Result<(), VfsError> {
        let conn = self.connections.get_mut(&session).ok_or(VfsError::NotFound)?;
        closer.close_connection(conn);
        Ok(())
    }

    pub fn get(&self, session: SessionId) -> Option<&Connection> {
        self.connections.get(&session)
    }

    pub fn get_mut(&mut self, session: SessionId) -> Option<&mut Connection> {
        self.connections.get_mut(&session)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }
}
