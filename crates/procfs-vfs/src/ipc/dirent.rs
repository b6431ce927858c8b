//! Directory listing codec.
//!
//! ```text
//! directory:  tag u32 | len u16 | name[len] | 0
//! file:       tag u32 | size u64 | len u16 | name[len] | 0
//! ```
//!
//! Integers are little-endian. Entries are packed back to back and a reader
//! steps over each one using its recorded name length.

use alloc::string::String;
use alloc::vec::Vec;
use procfs_ipc::info::{INFO_DIR, INFO_FILE};

use crate::core::{DirEntry, EntryKind, VfsError};

/// Bytes one entry occupies on the wire.
pub fn encoded_len(entry: &DirEntry) -> usize {
    let fixed = match entry.kind {
        EntryKind::Directory => 4 + 2,
        EntryKind::File { .. } => 4 + 8 + 2,
    };
    fixed + entry.name.len() + 1
}

/// Pack entries into at most `limit` bytes.
///
/// Only whole entries are written; packing stops at the first entry that
/// would not fit. Names longer than `u16::MAX` are skipped.
pub fn encode_entries(entries: &[DirEntry], limit: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        let Ok(len) = u16::try_from(entry.name.len()) else {
            continue;
        };
        if out.len() + encoded_len(entry) > limit {
            break;
        }
        match entry.kind {
            EntryKind::Directory => out.extend_from_slice(&INFO_DIR.to_le_bytes()),
            EntryKind::File { size } => {
                out.extend_from_slice(&INFO_FILE.to_le_bytes());
                out.extend_from_slice(&size.to_le_bytes());
            }
        }
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.push(0);
    }
    out
}

/// Iterator over packed listing entries.
pub struct DirentIter<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> DirentIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: false }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VfsError> {
        if self.buf.len() < n {
            return Err(VfsError::protocol("listing entry truncated"));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn next_entry(&mut self) -> Result<DirEntry, VfsError> {
        let tag = self.take(4)?;
        let tag = u32::from_le_bytes([tag[0], tag[1], tag[2], tag[3]]);
        let size = match tag {
            INFO_DIR => None,
            INFO_FILE => {
                let raw = self.take(8)?;
                let mut word = [0u8; 8];
                word.copy_from_slice(raw);
                Some(u64::from_le_bytes(word))
            }
            other => {
                return Err(VfsError::protocol(alloc::format!(
                    "unknown listing tag {:#x}",
                    other
                )))
            }
        };
        let len = self.take(2)?;
        let len = u16::from_le_bytes([len[0], len[1]]) as usize;
        let name = self.take(len + 1)?;
        let name = core::str::from_utf8(&name[..len])
            .map_err(|_| VfsError::protocol("listing name is not UTF-8"))?;
        let name = String::from(name);
        Ok(match size {
            None => DirEntry::directory(name),
            Some(size) => DirEntry::file(name, size),
        })
    }
}

impl Iterator for DirentIter<'_> {
    type Item = Result<DirEntry, VfsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }
        let entry = self.next_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}

/// Decode a whole listing reply.
pub fn decode_entries(buf: &[u8]) -> Result<Vec<DirEntry>, VfsError> {
    DirentIter::new(buf).collect()
}
