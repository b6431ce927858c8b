//! Path utilities for the namespace layer.
//!
//! Paths are `/`-separated byte strings. Empty segments (from `//` or a
//! trailing `/`) carry no name and are skipped during resolution.

use alloc::string::String;
use procfs_ipc::MAX_NAME_LEN;

use super::error::VfsError;

/// Extract a path from a request payload.
///
/// Clients may or may not send a NUL terminator; everything from the first
/// NUL on is ignored.
pub fn path_from_payload(payload: &[u8]) -> Result<&str, VfsError> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    core::str::from_utf8(&payload[..end])
        .map_err(|_| VfsError::invalid_path("path is not valid UTF-8"))
}

/// Check that a single directory or file name is usable.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && !name.contains('/') && !name.contains('\0')
}

/// Validate a path passed to file creation.
///
/// It must be absolute and must not end with `/`.
pub fn validate_create_path(path: &str) -> Result<(), VfsError> {
    if !path.starts_with('/') {
        return Err(VfsError::invalid_path("path must be absolute (start with /)"));
    }
    if path.ends_with('/') {
        return Err(VfsError::invalid_path("path must not end with /"));
    }
    Ok(())
}

/// Join a directory path and a name with exactly one separator.
pub fn join_path(dir: &str, name: &str) -> String {
    let mut out = String::from(dir.trim_end_matches('/'));
    out.push('/');
    out.push_str(name.trim_start_matches('/'));
    out
}
