//! ServerApp Trait and Core Types
//!
//! Defines the interface a proc server implements and the values that flow
//! through the dispatch loop.

use super::error::AppError;
use alloc::string::String;
use alloc::vec::Vec;
use procfs_ipc::{status, IoHeader, MSG_BUFFER_SIZE, SERVER_PATH};
use procfs_vfs::VfsError;

/// Stable per-client identifier, assigned on attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u32);

/// Identifies one in-flight request so its reply can be routed back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiveId(pub u32);

/// Static facts about the running server.
#[derive(Clone, Debug)]
pub struct ServerContext {
    /// Path the server is registered under
    pub path: String,

    /// Largest request payload the server accepts
    pub buffer_size: usize,

    /// Number of dispatch workers
    pub workers: usize,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self {
            path: String::from(SERVER_PATH),
            buffer_size: MSG_BUFFER_SIZE,
            workers: 1,
        }
    }
}

/// An I/O request received from a client.
#[derive(Clone, Debug)]
pub struct Message {
    /// Reply routing handle
    pub rcvid: ReceiveId,

    /// Session the request arrived on
    pub session: SessionId,

    /// Operation, code and declared sizes
    pub header: IoHeader,

    /// Inline request payload
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(rcvid: ReceiveId, session: SessionId, header: IoHeader, payload: Vec<u8>) -> Self {
        Self {
            rcvid,
            session,
            header,
            payload,
        }
    }
}

/// Anything the dispatch loop can receive.
#[derive(Clone, Debug)]
pub enum Event {
    /// A client connected
    Attach(SessionId),

    /// A client disconnected, cleanly or not
    Detach(SessionId),

    /// A client request awaiting exactly one reply
    Io(Message),
}

/// Reply to a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Zero or a byte count on success, negative on failure
    pub status: i32,

    /// Reply payload, clamped to the request's `rbytes` before sending
    pub payload: Vec<u8>,
}

impl Response {
    /// Success with no payload.
    pub fn ok() -> Self {
        Self::with_status(status::E_OK)
    }

    /// Success carrying a payload.
    pub fn ok_with(payload: Vec<u8>) -> Self {
        Self {
            status: status::E_OK,
            payload,
        }
    }

    /// Bare status code.
    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            payload: Vec::new(),
        }
    }

    /// Failure reply for a namespace error.
    pub fn error(err: &VfsError) -> Self {
        Self::with_status(err.status())
    }

    pub fn is_ok(&self) -> bool {
        self.status >= status::E_OK
    }
}

impl From<Result<Response, VfsError>> for Response {
    fn from(result: Result<Response, VfsError>) -> Self {
        result.unwrap_or_else(|e| Response::error(&e))
    }
}

/// Buffer handed to a sharing grant.
#[derive(Clone, Copy, Debug)]
pub struct SharedRegion<'a> {
    /// Buffer generation the grant refers to
    pub generation: u32,

    /// The file's current content buffer
    pub data: &'a [u8],
}

/// Grants and revokes a session's direct access to a buffer.
///
/// How pages actually reach the other process is up to the implementor.
pub trait ShareCapability {
    /// Grant `session` access to `region`.
    fn share(&mut self, session: SessionId, region: SharedRegion<'_>) -> Result<(), AppError>;

    /// Revoke whatever `session` was granted.
    fn unshare(&mut self, session: SessionId) -> Result<(), AppError>;
}

/// Source of events and sink of replies.
pub trait Channel {
    /// Block for the next event. `Ok(None)` means the channel is closed.
    fn receive(&mut self) -> Result<Option<Event>, AppError>;

    /// Send the reply for request `rcvid`.
    fn reply(&mut self, rcvid: ReceiveId, response: Response) -> Result<(), AppError>;
}

/// The interface a proc server implements.
///
/// # Lifecycle
///
/// 1. **init()**: Called once before the first event.
/// 2. **on_attach()** / **on_detach()**: Session bookkeeping, no reply.
/// 3. **on_message()**: Handle one request and produce its reply.
/// 4. **shutdown()**: Called once when the channel closes.
///
/// # Invariants
///
/// - Events are handled one at a time, in arrival order
/// - Every `Io` event yields exactly one `Response`; returning a value
///   instead of calling a reply primitive makes a missing or double reply
///   impossible
pub trait ServerApp {
    /// Called once when the server starts.
    fn init(&mut self, ctx: &ServerContext) -> Result<(), AppError>;

    /// A client attached with a fresh session id.
    fn on_attach(&mut self, ctx: &ServerContext, session: SessionId) -> Result<(), AppError>;

    /// A client detached; release everything the session holds.
    fn on_detach(&mut self, ctx: &ServerContext, session: SessionId) -> Result<(), AppError>;

    /// Handle one request.
    fn on_message(&mut self, ctx: &ServerContext, msg: &Message) -> Response;

    /// Called before the runtime returns.
    fn shutdown(&mut self, _ctx: &ServerContext) {}
}
