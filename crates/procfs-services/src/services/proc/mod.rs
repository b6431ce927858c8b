//! Proc Service
//!
//! Serves the in-memory namespace built from the boot image:
//!
//! - Bootstraps `/sys`, `/devices` and `/boot/<name>` once at startup
//! - Tracks one [`Connection`] per attached session
//! - Routes each request to exactly one handler and replies once
//!
//! # Architecture
//!
//! ```text
//! Client Process
//!        │
//!        │ Attach / Io / Detach
//!        ▼
//! ┌─────────────────┐
//! │  ServerRuntime  │  (procfs-dispatch, single worker)
//! └────────┬────────┘
//!          │ on_message
//!          ▼
//! ┌─────────────────┐      ┌─────────────────┐
//! │   ProcService   │ ───► │ ConnectionTable │
//! └────────┬────────┘      └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌─────────────────┐
//! │    Namespace    │      │ ShareCapability │  ◄── Share / Close / Detach
//! └─────────────────┘      └─────────────────┘
//! ```
//!
//! # Protocol
//!
//! - `INFO`: list a directory
//! - `OPEN` / `CLOSE`: bind or release a file on the session
//! - `READ` / `WRITE` / `SEEK`: cursor I/O on the bound file
//! - `TRUNCATE`: resize the bound file's buffer (page-rounded)
//! - `SHARE`: grant the session direct access to the buffer
//!
//! Unknown operations are answered with `E_INVAL`.

pub mod connection;
pub mod handlers;

#[cfg(test)]
mod tests;

use alloc::format;
use procfs_dispatch::{
    AppError, Message, Response, ServerApp, ServerContext, SessionId, ShareCapability,
};
use procfs_ipc::{status, IoOp};
use procfs_vfs::{
    bootstrap, BootImage, BootstrapError, BootstrapReport, ImageSource, Namespace, VfsError,
};

use crate::config::ServerConfig;
pub use connection::{CloseConnection, Connection, ConnectionState, ConnectionTable};

/// The proc server.
pub struct ProcService<S: ShareCapability> {
    config: ServerConfig,
    namespace: Namespace,
    connections: ConnectionTable,
    share: S,
    image: BootImage,
    report: Option<BootstrapReport>,
}

impl<S: ShareCapability> ProcService<S> {
    pub fn new(config: ServerConfig, share: S) -> Self {
        let namespace = Namespace::with_page_size(config.page_size);
        Self::with_namespace(config, namespace, share)
    }

    /// Serve an already populated namespace.
    pub fn with_namespace(config: ServerConfig, namespace: Namespace, share: S) -> Self {
        Self {
            config,
            namespace,
            connections: ConnectionTable::new(),
            share,
            image: BootImage::new(),
            report: None,
        }
    }

    /// Populate the namespace from a boot image.
    ///
    /// Any failure is fatal to startup.
    pub fn bootstrap(
        &mut self,
        source: &mut dyn ImageSource,
    ) -> Result<&BootstrapReport, BootstrapError> {
        let report = bootstrap(
            &mut self.namespace,
            &mut self.image,
            source,
            &self.config.layout(),
        )?;
        Ok(self.report.insert(report))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn share(&self) -> &S {
        &self.share
    }

    /// Result of the last successful bootstrap.
    pub fn report(&self) -> Option<&BootstrapReport> {
        self.report.as_ref()
    }

    fn route(&mut self, op: IoOp, msg: &Message) -> Result<Response, VfsError> {
        match op {
            IoOp::Info => self.handle_list(msg),
            IoOp::Open => self.handle_open(msg),
            IoOp::Close => self.handle_close(msg),
            IoOp::Read => self.handle_read(msg),
            IoOp::Write => self.handle_write(msg),
            IoOp::Seek => self.handle_seek(msg),
            IoOp::Truncate => self.handle_truncate(msg),
            IoOp::Share => self.handle_share(msg),
        }
    }
}

/// Tears a connection down: revoke the grant, drop the file reference,
/// reset the record.
pub(crate) struct Releaser<'a, S: ShareCapability> {
    pub namespace: &'a mut Namespace,
    pub share: &'a mut S,
}

impl<S: ShareCapability> CloseConnection for Releaser<'_, S> {
    fn close_connection(&mut self, conn: &mut Connection) {
        let session = conn.session();
        if conn.is_granted() {
            if let Err(e) = self.share.unshare(session) {
                log::warn!("ProcService: unshare for {:?} failed: {}", session, e);
            }
        }
        if let Some(file) = conn.reset() {
            match self.namespace.close_file(file) {
                Ok(refs) => log::trace!("ProcService: {:?} released {:?}, {} refs left", session, file, refs),
                Err(e) => log::warn!("ProcService: close of {:?} for {:?} failed: {}", file, session, e),
            }
        }
    }
}

impl<S: ShareCapability> ServerApp for ProcService<S> {
    fn init(&mut self, ctx: &ServerContext) -> Result<(), AppError> {
        self.config
            .validate()
            .map_err(|e| AppError::InitFailed(format!("{}", e)))?;
        log::info!(
            "ProcService: serving {} ({} files, {} directories)",
            ctx.path,
            self.namespace.file_count(),
            self.namespace.dir_count()
        );
        Ok(())
    }

    fn on_attach(&mut self, _ctx: &ServerContext, session: SessionId) -> Result<(), AppError> {
        self.connections.attach(session)?;
        log::debug!("ProcService: {:?} attached", session);
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &ServerContext, session: SessionId) -> Result<(), AppError> {
        let mut releaser = Releaser {
            namespace: &mut self.namespace,
            share: &mut self.share,
        };
        self.connections.detach(session, &mut releaser)?;
        log::debug!("ProcService: {:?} detached", session);
        Ok(())
    }

    fn on_message(&mut self, _ctx: &ServerContext, msg: &Message) -> Response {
        let Some(op) = msg.header.operation() else {
            log::debug!(
                "ProcService: {:?} sent unknown operation {:#x}",
                msg.session,
                msg.header.op
            );
            return Response::with_status(status::E_INVAL);
        };
        match self.route(op, msg) {
            Ok(response) => response,
            Err(e) => {
                log::debug!("ProcService: {} from {:?} failed: {}", op.name(), msg.session, e);
                Response::error(&e)
            }
        }
    }

    fn shutdown(&mut self, _ctx: &ServerContext) {
        log::info!(
            "ProcService: shutting down with {} sessions attached",
            self.connections.len()
        );
    }
}
