//! Test utilities for service unit tests.
//!
//! These helpers build requests and stand in for the sharing capability
//! and the channel without a running client.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use procfs_dispatch::{
    AppError, Channel, Event, Message, ReceiveId, Response, SessionId, ShareCapability,
    SharedRegion,
};
use procfs_ipc::{IoHeader, IoOp};

/// Create a request whose `sbytes` matches the payload.
pub fn mock_message(op: IoOp, code: u32, session: u32, payload: Vec<u8>, rbytes: u32) -> Message {
    let header = IoHeader::new(op, code, payload.len() as u32, rbytes);
    Message::new(ReceiveId(0), SessionId(session), header, payload)
}

/// Payload carrying a NUL-terminated path.
pub fn path_payload(path: &str) -> Vec<u8> {
    let mut out = Vec::from(path.as_bytes());
    out.push(0);
    out
}

/// Sharing capability that records every call.
#[derive(Debug, Default)]
pub struct RecordingShare {
    /// Live grants: session -> (generation, length)
    pub grants: BTreeMap<SessionId, (u32, usize)>,
    pub shares: usize,
    pub unshares: usize,
    /// Make the next `share` call fail
    pub fail_next: bool,
}

impl ShareCapability for RecordingShare {
    fn share(&mut self, session: SessionId, region: SharedRegion<'_>) -> Result<(), AppError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(AppError::ShareFailed(String::from("refused")));
        }
        self.shares += 1;
        self.grants
            .insert(session, (region.generation, region.data.len()));
        Ok(())
    }

    fn unshare(&mut self, session: SessionId) -> Result<(), AppError> {
        self.unshares += 1;
        self.grants
            .remove(&session)
            .map(|_| ())
            .ok_or_else(|| AppError::ShareFailed(String::from("no grant")))
    }
}

/// Channel fed from a queue; collects replies.
#[derive(Debug, Default)]
pub struct QueueChannel {
    pub events: VecDeque<Event>,
    pub replies: Vec<(ReceiveId, Response)>,
}

impl QueueChannel {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            replies: Vec::new(),
        }
    }
}

impl Channel for QueueChannel {
    fn receive(&mut self) -> Result<Option<Event>, AppError> {
        Ok(self.events.pop_front())
    }

    fn reply(&mut self, rcvid: ReceiveId, response: Response) -> Result<(), AppError> {
        self.replies.push((rcvid, response));
        Ok(())
    }
}
