//! Core types for the namespace layer.
//!
//! Defines node handles, access flags, open modes and directory entries.

use alloc::string::String;
use bitflags::bitflags;
use procfs_ipc::open;
use serde::{Deserialize, Serialize};

use super::error::VfsError;

/// Handle to a directory in the namespace arena.
///
/// Directories are never removed, so a `DirId` stays valid for the life of
/// the namespace that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirId(pub(crate) u32);

impl DirId {
    /// The root directory.
    pub const ROOT: DirId = DirId(0);

    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to a file in the namespace arena.
///
/// Slots are reused after deletion; the generation makes a handle to a
/// deleted file resolve to `NotFound` instead of aliasing its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl FileId {
    /// Raw arena slot.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Slot generation at the time this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

bitflags! {
    /// Access bitmask carried by every file.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        /// Contents may be read
        const READ = 0x1;
        /// Contents may be written
        const WRITE = 0x2;
        /// Contents may be executed
        const EXEC = 0x4;
        /// Buffer may be resized and shared with other processes
        const MAP = 0x8;
    }
}

impl AccessFlags {
    /// Flags for synthesized read-only files.
    pub fn read_only() -> Self {
        Self::READ
    }

    /// Flags for files created through an open request.
    pub fn created() -> Self {
        Self::READ | Self::WRITE | Self::MAP
    }

    /// Flags for files loaded from the boot image.
    pub fn boot_file() -> Self {
        Self::READ | Self::WRITE | Self::EXEC | Self::MAP
    }
}

/// Access mode requested when opening a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl OpenMode {
    /// Decode the access bits of an open request's `code`.
    pub fn from_flags(code: u32) -> Result<Self, VfsError> {
        match code & open::O_ACCMODE {
            open::O_RDONLY => Ok(OpenMode::ReadOnly),
            open::O_WRONLY => Ok(OpenMode::WriteOnly),
            open::O_RDWR => Ok(OpenMode::ReadWrite),
            other => Err(VfsError::invalid_argument(alloc::format!(
                "unknown access mode {:#x}",
                other
            ))),
        }
    }

    /// File flags a non-read-only open must find on the file.
    pub fn required(&self) -> AccessFlags {
        match self {
            OpenMode::ReadOnly => AccessFlags::READ,
            OpenMode::WriteOnly => AccessFlags::WRITE,
            OpenMode::ReadWrite => AccessFlags::READ | AccessFlags::WRITE,
        }
    }

    pub fn can_read(&self) -> bool {
        matches!(self, OpenMode::ReadOnly | OpenMode::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, OpenMode::WriteOnly | OpenMode::ReadWrite)
    }
}

/// Kind of a directory listing entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Directory,
    File {
        /// Content size in bytes
        size: u64,
    },
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File { size },
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}
