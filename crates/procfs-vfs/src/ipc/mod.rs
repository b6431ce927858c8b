//! Proc IPC protocol helpers
//!
//! Wire constants live in `procfs-ipc`; this module re-exports them and adds
//! the payload codecs that need `alloc`.

mod dirent;

pub use dirent::{decode_entries, encode_entries, encoded_len, DirentIter};

/// Wire constants, re-exported from `procfs-ipc`.
pub mod proc_msg {
    pub use procfs_ipc::info::*;
    pub use procfs_ipc::open::*;
    pub use procfs_ipc::seek::*;
    pub use procfs_ipc::status::*;
    pub use procfs_ipc::{IoHeader, IoOp};
}
