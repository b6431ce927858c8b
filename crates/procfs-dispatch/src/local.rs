//! In-process channel over `std::sync::mpsc`.
//!
//! Lets a server run on its own thread while clients in the same process
//! talk to it through [`procfs_vfs::Transport`]. Each client is one session;
//! dropping it detaches.
//!
//! ```text
//!  LocalClient ──Envelope──►┐
//!  LocalClient ──Envelope──►├──► LocalChannel (server thread)
//!                           │        │
//!  reply ◄── per-request ───┴────────┘
//! ```

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use procfs_ipc::IoHeader;
use procfs_vfs::{Transport, VfsError};

use super::app::{
    Channel, Event, Message, ReceiveId, Response, SessionId, ShareCapability, SharedRegion,
};
use super::error::AppError;

struct Envelope {
    event: Event,
    reply: Option<Sender<Response>>,
}

/// Server end of an in-process channel.
pub struct LocalChannel {
    rx: Receiver<Envelope>,
    pending: BTreeMap<ReceiveId, Sender<Response>>,
    next_rcvid: u32,
}

/// Hands out new client sessions for a [`LocalChannel`].
#[derive(Clone)]
pub struct LocalConnector {
    tx: Sender<Envelope>,
    next_session: Arc<AtomicU32>,
}

/// One client session.
pub struct LocalClient {
    tx: Sender<Envelope>,
    session: SessionId,
}

impl LocalChannel {
    /// Create a channel and the connector clients attach through.
    pub fn new() -> (LocalChannel, LocalConnector) {
        let (tx, rx) = channel();
        let channel = LocalChannel {
            rx,
            pending: BTreeMap::new(),
            next_rcvid: 1,
        };
        let connector = LocalConnector {
            tx,
            next_session: Arc::new(AtomicU32::new(1)),
        };
        (channel, connector)
    }
}

impl Channel for LocalChannel {
    fn receive(&mut self) -> Result<Option<Event>, AppError> {
        let Ok(envelope) = self.rx.recv() else {
            return Ok(None);
        };
        let event = match envelope.event {
            Event::Io(mut msg) => {
                msg.rcvid = ReceiveId(self.next_rcvid);
                self.next_rcvid = self.next_rcvid.wrapping_add(1);
                if let Some(reply) = envelope.reply {
                    self.pending.insert(msg.rcvid, reply);
                }
                Event::Io(msg)
            }
            other => other,
        };
        Ok(Some(event))
    }

    fn reply(&mut self, rcvid: ReceiveId, response: Response) -> Result<(), AppError> {
        let reply = self
            .pending
            .remove(&rcvid)
            .ok_or_else(|| AppError::IpcError(format!("no pending request {:?}", rcvid)))?;
        reply
            .send(response)
            .map_err(|_| AppError::IpcError("client went away".to_string()))
    }
}

impl LocalConnector {
    /// Attach a new session.
    pub fn connect(&self) -> Result<LocalClient, AppError> {
        let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        self.tx
            .send(Envelope {
                event: Event::Attach(session),
                reply: None,
            })
            .map_err(|_| AppError::IpcError("server is not running".to_string()))?;
        Ok(LocalClient {
            tx: self.tx.clone(),
            session,
        })
    }
}

impl LocalClient {
    pub fn session(&self) -> SessionId {
        self.session
    }
}

impl Transport for LocalClient {
    fn send(&mut self, header: IoHeader, payload: &[u8]) -> Result<(i32, Vec<u8>), VfsError> {
        let (reply_tx, reply_rx) = channel();
        let msg = Message::new(ReceiveId(0), self.session, header, payload.to_vec());
        self.tx
            .send(Envelope {
                event: Event::Io(msg),
                reply: Some(reply_tx),
            })
            .map_err(|_| VfsError::protocol("server is not running"))?;
        let response = reply_rx
            .recv()
            .map_err(|_| VfsError::protocol("server dropped the request"))?;
        Ok((response.status, response.payload))
    }
}

impl Drop for LocalClient {
    fn drop(&mut self) {
        // The server may already be gone; nothing left to release then.
        let _ = self.tx.send(Envelope {
            event: Event::Detach(self.session),
            reply: None,
        });
    }
}

/// Sharing capability for in-process clients.
///
/// Both sides already live in one address space, so a grant only needs to
/// be recorded.
#[derive(Debug, Default)]
pub struct LocalShare {
    grants: BTreeMap<SessionId, (u32, usize)>,
}

impl LocalShare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation and length granted to `session`, if any.
    pub fn grant(&self, session: SessionId) -> Option<(u32, usize)> {
        self.grants.get(&session).copied()
    }
}

impl ShareCapability for LocalShare {
    fn share(&mut self, session: SessionId, region: SharedRegion<'_>) -> Result<(), AppError> {
        log::debug!(
            "LocalShare: {:?} granted {} bytes (generation {})",
            session,
            region.data.len(),
            region.generation
        );
        self.grants
            .insert(session, (region.generation, region.data.len()));
        Ok(())
    }

    fn unshare(&mut self, session: SessionId) -> Result<(), AppError> {
        self.grants
            .remove(&session)
            .map(|_| ())
            .ok_or_else(|| AppError::ShareFailed(format!("{:?} holds no grant", session)))
    }
}
