//! Namespace Tree
//!
//! The in-memory directory/file hierarchy served by the proc server.
//!
//! # Storage
//!
//! Nodes live in two arenas owned by [`Namespace`]:
//!
//! - **Directories** are appended and never removed; a [`DirId`] is a plain
//!   index and stays valid forever.
//! - **Files** occupy reusable slots. A [`FileId`] carries the slot's
//!   generation so a handle to a deleted file never aliases a newer one.
//!
//! Parent/child links are indices, not references. Children are kept in
//! creation order and looked up newest-first, which makes listing order
//! LIFO. Callers must not rely on that order.
//!
//! # Resolution
//!
//! ```text
//! resolve(root, "/boot/bin/echo")
//!
//!   /  ──boot──►  boot  ──bin?──►  (no such directory)
//!                   │
//!                   └── returns (boot, Some("bin/echo"))
//! ```
//!
//! Resolution greedily follows existing child directories and stops at the
//! first segment that does not name one. The unmatched suffix is handed back
//! so creation can build the missing directories and lookup can find the
//! terminal file.

use alloc::string::String;
use alloc::vec::Vec;
use procfs_ipc::PAGE_SIZE;

use crate::core::{
    is_valid_name, validate_create_path, AccessFlags, DirEntry, DirId, FileId, OpenMode, VfsError,
};

/// A directory node.
#[derive(Clone, Debug)]
pub struct DirNode {
    name: String,
    parent: Option<DirId>,
    dirs: Vec<DirId>,
    files: Vec<FileId>,
}

impl DirNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning directory, `None` for the root.
    pub fn parent(&self) -> Option<DirId> {
        self.parent
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// A file node and its content buffer.
#[derive(Clone, Debug)]
pub struct FileNode {
    name: String,
    owner: DirId,
    data: Vec<u8>,
    access: AccessFlags,
    refs: u32,
    buffer_generation: u32,
}

impl FileNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> DirId {
        self.owner
    }

    /// Content size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    /// Number of outstanding opens.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Bumped every time the content buffer is replaced.
    ///
    /// A sharing grant taken at an older generation refers to a buffer that
    /// no longer backs this file.
    pub fn buffer_generation(&self) -> u32 {
        self.buffer_generation
    }
}

#[derive(Clone, Debug)]
struct FileSlot {
    generation: u32,
    node: Option<FileNode>,
}

/// The directory/file tree.
#[derive(Clone, Debug)]
pub struct Namespace {
    dirs: Vec<DirNode>,
    files: Vec<FileSlot>,
    free: Vec<u32>,
    page_size: usize,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    /// Create a namespace holding only the root directory.
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    /// Create a namespace that rounds truncated buffers to `page_size`.
    pub fn with_page_size(page_size: usize) -> Self {
        let root = DirNode {
            name: String::new(),
            parent: None,
            dirs: Vec::new(),
            files: Vec::new(),
        };
        Self {
            dirs: alloc::vec![root],
            files: Vec::new(),
            free: Vec::new(),
            page_size: if page_size == 0 { PAGE_SIZE } else { page_size },
        }
    }

    pub fn root(&self) -> DirId {
        DirId::ROOT
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of directories, root included.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Number of live files.
    pub fn file_count(&self) -> usize {
        self.files.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn dir(&self, id: DirId) -> Option<&DirNode> {
        self.dirs.get(id.index())
    }

    /// Look up a live file.
    pub fn file(&self, id: FileId) -> Result<&FileNode, VfsError> {
        self.files
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(VfsError::NotFound)
    }

    fn file_mut(&mut self, id: FileId) -> Result<&mut FileNode, VfsError> {
        self.files
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(VfsError::NotFound)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn child_dir(&self, parent: DirId, name: &str) -> Option<DirId> {
        let node = self.dir(parent)?;
        node.dirs
            .iter()
            .rev()
            .copied()
            .find(|d| self.dirs[d.index()].name == name)
    }

    fn child_file(&self, parent: DirId, name: &str) -> Option<FileId> {
        let node = self.dir(parent)?;
        node.files
            .iter()
            .rev()
            .copied()
            .find(|f| matches!(self.file(*f), Ok(n) if n.name == name))
    }

    /// Follow existing directories along `path`.
    ///
    /// Starts at `cwd`, or the root when `None`. Returns the deepest matched
    /// directory and the unmatched suffix (without a leading `/`), or `None`
    /// when every segment matched a directory.
    pub fn resolve<'p>(&self, cwd: Option<DirId>, path: &'p str) -> (DirId, Option<&'p str>) {
        let mut current = cwd.unwrap_or(DirId::ROOT);
        let mut rest = path;
        loop {
            rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                return (current, None);
            }
            let (segment, tail) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            };
            match self.child_dir(current, segment) {
                Some(child) => {
                    current = child;
                    rest = tail;
                }
                None => return (current, Some(rest)),
            }
        }
    }

    /// Resolve a path that must name an existing directory exactly.
    pub fn lookup_dir(&self, cwd: Option<DirId>, path: &str) -> Result<DirId, VfsError> {
        match self.resolve(cwd, path) {
            (dir, None) => Ok(dir),
            (_, Some(rest)) => Err(VfsError::invalid_path(alloc::format!(
                "'{}' is not a directory",
                rest
            ))),
        }
    }

    /// Find a file by path.
    ///
    /// Returns `None` if the path ends with `/`, if a directory segment
    /// does not resolve, or if no file carries the terminal name.
    ///
    /// Unlike [`create_file`](Self::create_file), a path without a leading
    /// `/` is accepted and resolved from `cwd`. The server's request
    /// handlers refuse relative paths before they get here.
    pub fn get_file(&self, cwd: Option<DirId>, path: &str) -> Option<FileId> {
        if path.is_empty() || path.ends_with('/') {
            return None;
        }
        let (dir, rest) = self.resolve(cwd, path);
        let name = rest?;
        if name.contains('/') {
            return None;
        }
        self.child_file(dir, name)
    }

    /// Absolute path of a live file.
    pub fn path_of(&self, id: FileId) -> Result<String, VfsError> {
        let file = self.file(id)?;
        let mut parts = alloc::vec![file.name.as_str()];
        let mut dir = Some(file.owner);
        while let Some(d) = dir {
            let node = &self.dirs[d.index()];
            if node.parent.is_some() {
                parts.push(node.name.as_str());
            }
            dir = node.parent;
        }
        let mut out = String::new();
        for part in parts.iter().rev() {
            out.push('/');
            out.push_str(part);
        }
        Ok(out)
    }

    // =========================================================================
    // Creation / deletion
    // =========================================================================

    /// Create a file, building any missing intermediate directories.
    ///
    /// The path must start with `/` and must not end with `/`. Fails with
    /// `InvalidPath` when the path already names a directory or a file, or
    /// when a segment is not a valid name. On failure the tree is unchanged.
    pub fn create_file(
        &mut self,
        cwd: Option<DirId>,
        path: &str,
        data: Vec<u8>,
        access: AccessFlags,
    ) -> Result<FileId, VfsError> {
        validate_create_path(path)?;

        let (mut parent, rest) = self.resolve(cwd, path);
        let rest = rest.ok_or_else(|| VfsError::invalid_path("path names an existing directory"))?;

        let mut missing: Vec<&str> = rest.split('/').collect();
        let name = missing.pop().unwrap_or_default();
        if let Some(bad) = missing.iter().chain(core::iter::once(&name)).find(|s| !is_valid_name(s)) {
            return Err(VfsError::invalid_path(alloc::format!("invalid name '{}'", bad)));
        }
        if missing.is_empty() && self.child_file(parent, name).is_some() {
            return Err(VfsError::invalid_path("file already exists"));
        }
        if self.dirs.len() + missing.len() > u32::MAX as usize {
            return Err(VfsError::ResourceExhausted);
        }

        for dir_name in missing {
            parent = self.add_dir(parent, dir_name);
        }

        let node = FileNode {
            name: String::from(name),
            owner: parent,
            data,
            access,
            refs: 0,
            buffer_generation: 0,
        };
        let id = self.alloc_file(node)?;
        self.dirs[parent.index()].files.push(id);
        log::trace!("Namespace: created file '{}' in dir {}", name, parent.index());
        Ok(id)
    }

    fn add_dir(&mut self, parent: DirId, name: &str) -> DirId {
        let id = DirId(self.dirs.len() as u32);
        self.dirs.push(DirNode {
            name: String::from(name),
            parent: Some(parent),
            dirs: Vec::new(),
            files: Vec::new(),
        });
        self.dirs[parent.index()].dirs.push(id);
        id
    }

    fn alloc_file(&mut self, node: FileNode) -> Result<FileId, VfsError> {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.files[slot as usize];
            entry.node = Some(node);
            return Ok(FileId {
                slot,
                generation: entry.generation,
            });
        }
        let slot = u32::try_from(self.files.len()).map_err(|_| VfsError::ResourceExhausted)?;
        self.files.push(FileSlot {
            generation: 0,
            node: Some(node),
        });
        Ok(FileId {
            slot,
            generation: 0,
        })
    }

    /// Remove a file and release its buffer.
    ///
    /// Fails with `Busy` while the file is open.
    pub fn delete_file(&mut self, id: FileId) -> Result<(), VfsError> {
        let file = self.file(id)?;
        if file.refs > 0 {
            return Err(VfsError::Busy);
        }
        let owner = file.owner;
        self.dirs[owner.index()].files.retain(|f| *f != id);

        let entry = &mut self.files[id.slot as usize];
        entry.node = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        Ok(())
    }

    // =========================================================================
    // Open / close
    // =========================================================================

    /// Take a reference on a file for the given mode.
    ///
    /// Read-only opens always succeed; other modes need every flag
    /// [`OpenMode::required`] lists.
    pub fn open_file(&mut self, id: FileId, mode: OpenMode) -> Result<(), VfsError> {
        let file = self.file_mut(id)?;
        if mode != OpenMode::ReadOnly && !file.access.contains(mode.required()) {
            return Err(VfsError::AccessDenied);
        }
        file.refs = file.refs.checked_add(1).ok_or(VfsError::ResourceExhausted)?;
        Ok(())
    }

    /// Drop a reference taken by [`Namespace::open_file`].
    ///
    /// Returns the remaining reference count.
    pub fn close_file(&mut self, id: FileId) -> Result<u32, VfsError> {
        let file = self.file_mut(id)?;
        if file.refs == 0 {
            return Err(VfsError::protocol("file has no open references"));
        }
        file.refs -= 1;
        Ok(file.refs)
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Bytes available at `offset`, at most `max` of them.
    ///
    /// Empty when `offset` is at or past the end.
    pub fn read_at(&self, id: FileId, offset: u64, max: usize) -> Result<&[u8], VfsError> {
        let data = &self.file(id)?.data;
        let start = match usize::try_from(offset) {
            Ok(s) if s < data.len() => s,
            _ => return Ok(&[]),
        };
        let len = max.min(data.len() - start);
        Ok(&data[start..start + len])
    }

    /// Overwrite bytes at `offset`. Never grows the file.
    ///
    /// Returns how many bytes were written.
    pub fn write_at(&mut self, id: FileId, offset: u64, bytes: &[u8]) -> Result<usize, VfsError> {
        let data = &mut self.file_mut(id)?.data;
        let start = match usize::try_from(offset) {
            Ok(s) if s < data.len() => s,
            _ => return Ok(0),
        };
        let len = bytes.len().min(data.len() - start);
        data[start..start + len].copy_from_slice(&bytes[..len]);
        Ok(len)
    }

    /// Replace a file's buffer with one of `size` bytes rounded up to the
    /// page size.
    ///
    /// Existing bytes are kept up to the smaller of the two sizes and any
    /// new tail is zeroed. The file must carry [`AccessFlags::MAP`].
    /// Returns the new size.
    pub fn truncate(&mut self, id: FileId, size: u64) -> Result<usize, VfsError> {
        let page_size = self.page_size;
        let file = self.file_mut(id)?;
        if !file.access.contains(AccessFlags::MAP) {
            return Err(VfsError::AccessDenied);
        }
        if size == 0 {
            return Err(VfsError::invalid_argument("truncate size must be non-zero"));
        }
        let new_len = usize::try_from(size)
            .ok()
            .and_then(|s| s.checked_next_multiple_of(page_size))
            .ok_or_else(|| VfsError::invalid_argument("truncate size overflows"))?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(new_len)
            .map_err(|_| VfsError::ResourceExhausted)?;
        let keep = file.data.len().min(new_len);
        buffer.extend_from_slice(&file.data[..keep]);
        buffer.resize(new_len, 0);

        file.data = buffer;
        file.buffer_generation = file.buffer_generation.wrapping_add(1);
        Ok(new_len)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Entries of a directory: subdirectories first, then files.
    pub fn entries(&self, dir: DirId) -> Result<Vec<DirEntry>, VfsError> {
        let node = self.dir(dir).ok_or(VfsError::NotFound)?;
        let mut out = Vec::with_capacity(node.dirs.len() + node.files.len());
        for d in node.dirs.iter().rev() {
            out.push(DirEntry::directory(self.dirs[d.index()].name.as_str()));
        }
        for f in node.files.iter().rev() {
            let file = self.file(*f)?;
            out.push(DirEntry::file(file.name.as_str(), file.data.len() as u64));
        }
        Ok(out)
    }
}
