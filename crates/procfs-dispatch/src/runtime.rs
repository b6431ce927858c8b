//! Server Runtime
//!
//! Drives a [`ServerApp`] from a [`Channel`] with a single worker: one event
//! is received, handled and (for requests) replied to before the next one is
//! received.

use super::app::{Channel, Event, Message, ReceiveId, Response, ServerApp, ServerContext};
use super::error::{AppError, ProtocolError};
use procfs_ipc::status;

/// Counters kept by the runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub attaches: u64,
    pub detaches: u64,
    pub requests: u64,
    /// Requests rejected before reaching the app
    pub rejected: u64,
    /// Replies the channel failed to deliver
    pub lost_replies: u64,
}

/// Single-worker dispatch loop.
pub struct ServerRuntime {
    ctx: ServerContext,
    stats: RuntimeStats,
}

impl ServerRuntime {
    pub fn new(ctx: ServerContext) -> Self {
        Self {
            ctx,
            stats: RuntimeStats::default(),
        }
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Run until the channel closes.
    ///
    /// # Failure Modes
    ///
    /// - Init failure: returned as-is, no event is received
    /// - Attach/detach errors: logged, loop continues
    /// - Reply delivery failure: logged and counted, loop continues
    /// - Receive failure: `shutdown()` is called and the error returned
    pub fn run<A: ServerApp, C: Channel>(
        &mut self,
        app: &mut A,
        channel: &mut C,
    ) -> Result<RuntimeStats, AppError> {
        if self.ctx.workers != 1 {
            return Err(AppError::InitFailed(alloc::format!(
                "{} workers requested, only one is supported",
                self.ctx.workers
            )));
        }
        app.init(&self.ctx)?;
        log::info!("ServerRuntime: serving {}", self.ctx.path);

        loop {
            let event = match channel.receive() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    app.shutdown(&self.ctx);
                    return Err(e);
                }
            };
            if let Some((rcvid, response)) = self.dispatch(app, event) {
                if let Err(e) = channel.reply(rcvid, response) {
                    self.stats.lost_replies += 1;
                    log::warn!("ServerRuntime: reply {:?} lost: {}", rcvid, e);
                }
            }
        }

        app.shutdown(&self.ctx);
        log::info!("ServerRuntime: channel closed, {:?}", self.stats);
        Ok(self.stats)
    }

    /// Handle one event.
    ///
    /// Returns the reply to send for `Io` events.
    pub fn dispatch<A: ServerApp>(&mut self, app: &mut A, event: Event) -> Option<(ReceiveId, Response)> {
        match event {
            Event::Attach(session) => {
                self.stats.attaches += 1;
                if let Err(e) = app.on_attach(&self.ctx, session) {
                    log::warn!("ServerRuntime: attach {:?} failed: {}", session, e);
                }
                None
            }
            Event::Detach(session) => {
                self.stats.detaches += 1;
                if let Err(e) = app.on_detach(&self.ctx, session) {
                    log::warn!("ServerRuntime: detach {:?} failed: {}", session, e);
                }
                None
            }
            Event::Io(mut msg) => {
                self.stats.requests += 1;
                let rcvid = msg.rcvid;
                let response = match self.frame(&mut msg) {
                    Ok(()) => app.on_message(&self.ctx, &msg),
                    Err(e) => {
                        self.stats.rejected += 1;
                        log::debug!("ServerRuntime: rejected {:?}: {}", rcvid, e);
                        Response::with_status(status::E_INVAL)
                    }
                };
                Some((rcvid, clamp(response, msg.header.rbytes as usize)))
            }
        }
    }

    /// Trim the payload to the declared size and check it fits the buffer.
    fn frame(&self, msg: &mut Message) -> Result<(), ProtocolError> {
        if msg.header.operation().is_none() {
            return Err(ProtocolError::UnknownOperation(msg.header.op));
        }
        let declared = msg.header.sbytes as usize;
        if declared > self.ctx.buffer_size {
            return Err(ProtocolError::BufferOverflow {
                size: declared,
                limit: self.ctx.buffer_size,
            });
        }
        if declared > msg.payload.len() {
            return Err(ProtocolError::PayloadOverflow {
                declared,
                available: msg.payload.len(),
            });
        }
        msg.payload.truncate(declared);
        Ok(())
    }
}

fn clamp(mut response: Response, rbytes: usize) -> Response {
    if response.payload.len() > rbytes {
        log::trace!(
            "ServerRuntime: clamping reply from {} to {} bytes",
            response.payload.len(),
            rbytes
        );
        response.payload.truncate(rbytes);
    }
    response
}
