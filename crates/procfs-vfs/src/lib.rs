//! Proc Filesystem Namespace Layer
//!
//! The in-memory half of the proc server:
//!
//! - **Core**: node handles, access flags, open modes, errors, path helpers
//! - **Tree**: the directory/file arena with resolution and file lifecycle
//! - **Image**: the two-phase boot image parser
//! - **Bootstrap**: populates the tree from the boot image at startup
//! - **IPC**: listing codec on top of the `procfs-ipc` constants
//! - **Client**: typed wrapper over the wire protocol
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   init/parse/delete   ┌──────────────┐
//! │  Bootstrap   │ ────────────────────► │  BootImage   │
//! └──────┬───────┘                       └──────────────┘
//!        │ create_file
//!        ▼
//! ┌──────────────┐   open/read/write/    ┌──────────────┐
//! │  Namespace   │ ◄──────────────────── │   Handlers   │  (procfs-services)
//! │  dirs │ files│   truncate/list       └──────────────┘
//! └──────────────┘
//! ```
//!
//! Nothing here is thread-safe by itself; the server owns the namespace
//! and mutates it from a single dispatch loop.

#![no_std]
extern crate alloc;

pub mod client;
pub mod core;
pub mod image;
pub mod ipc;
pub mod testing;

pub mod bootstrap;
pub mod tree;

// Convenient re-exports at crate root
pub use bootstrap::{bootstrap, BootstrapError, BootstrapLayout, BootstrapReport};
pub use client::{ProcClient, Transport};
pub use crate::core::{AccessFlags, DirEntry, DirId, EntryKind, FileId, OpenMode, VfsError};
pub use image::{BootImage, FileType, ImageError, ImageSource};
pub use ipc::proc_msg;
pub use tree::{DirNode, FileNode, Namespace};
