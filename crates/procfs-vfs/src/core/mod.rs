//! Core VFS types and utilities

mod error;
mod path;
mod types;

pub use error::VfsError;
pub use path::{is_valid_name, join_path, path_from_payload, validate_create_path};
pub use types::{AccessFlags, DirEntry, DirId, EntryKind, FileId, OpenMode};
