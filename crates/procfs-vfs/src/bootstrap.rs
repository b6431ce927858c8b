//! Namespace bootstrap from the boot image.
//!
//! Runs once at server start:
//!
//! ```text
//! /
//! ├── sys        (read-only: version, arch, machine, RAM size)
//! ├── devices    (read-only: one line per device)
//! └── boot/
//!     └── <name> (one per embedded file: read/write/exec/map)
//! ```
//!
//! Every fact is copied out of the image, which is released before
//! returning whether population succeeded or not.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::core::{join_path, AccessFlags, FileId, VfsError};
use crate::image::{BootImage, ImageError, ImageSource, RamInfo};
use crate::tree::Namespace;

/// Where the bootstrap places its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapLayout {
    pub sys_path: String,
    pub devices_path: String,
    pub boot_dir: String,
}

impl Default for BootstrapLayout {
    fn default() -> Self {
        Self {
            sys_path: String::from("/sys"),
            devices_path: String::from("/devices"),
            boot_dir: String::from("/boot"),
        }
    }
}

/// Summary of a completed bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapReport {
    pub version: String,
    pub arch: String,
    pub machine: String,
    pub ram: RamInfo,
    pub devices: usize,
    /// Paths of the files created under the boot directory
    pub boot_files: Vec<String>,
    /// Arguments of the image's startup commands, in table order
    pub commands: Vec<String>,
}

/// Fatal startup error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("boot image: {0}")]
    Image(#[from] ImageError),

    #[error("namespace: {0}")]
    Namespace(#[from] VfsError),
}

/// Text of the `/sys` file.
pub fn sys_text(version: &str, arch: &str, machine: &str, ram: RamInfo) -> String {
    format!(
        "Version: {}\nArch: {}\nMach: {}\nRam Size: 0x{:x}\n",
        version, arch, machine, ram.size
    )
}

fn devices_text(image: &BootImage) -> Result<String, ImageError> {
    let mut out = String::new();
    for index in 0..image.device_count()? {
        let dev = image.device(index)?;
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{{\"{}\", @0x{:x}, 0x{:x}}}", dev.name, dev.addr, dev.size);
    }
    Ok(out)
}

fn copy_out(data: &[u8]) -> Result<Vec<u8>, VfsError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(data.len())
        .map_err(|_| VfsError::ResourceExhausted)?;
    buffer.extend_from_slice(data);
    Ok(buffer)
}

/// Map, parse and copy the boot image into `ns`, then release it.
pub fn bootstrap(
    ns: &mut Namespace,
    image: &mut BootImage,
    source: &mut dyn ImageSource,
    layout: &BootstrapLayout,
) -> Result<BootstrapReport, BootstrapError> {
    image.init(source)?;

    let parsed = image.parse().map(|_| ());
    let result = match parsed {
        Ok(()) => populate(ns, image, layout),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = image.delete() {
        log::warn!("Bootstrap: failed to release boot image: {}", e);
    }

    match &result {
        Ok(report) => log::info!(
            "Bootstrap: {} {} {}, {} devices, {} boot files",
            report.version,
            report.arch,
            report.machine,
            report.devices,
            report.boot_files.len()
        ),
        Err(e) => log::error!("Bootstrap: aborted: {}", e),
    }
    result
}

fn populate(
    ns: &mut Namespace,
    image: &BootImage,
    layout: &BootstrapLayout,
) -> Result<BootstrapReport, BootstrapError> {
    image.dump_header()?;

    let ram = image.ram()?;
    let sys = sys_text(image.version()?, image.arch()?, image.machine()?, ram);
    ns.create_file(None, &layout.sys_path, sys.into_bytes(), AccessFlags::read_only())?;

    let devices = devices_text(image)?;
    ns.create_file(
        None,
        &layout.devices_path,
        devices.into_bytes(),
        AccessFlags::read_only(),
    )?;

    let mut boot_files = Vec::new();
    let mut by_index: Vec<FileId> = Vec::new();
    for index in 0..image.file_count()? {
        let file = image.file(index)?;
        let path = join_path(&layout.boot_dir, file.name);
        let id = ns.create_file(None, &path, copy_out(file.data)?, AccessFlags::boot_file())?;
        log::debug!(
            "Bootstrap: {} ({}, {} bytes)",
            path,
            file.kind.name(),
            file.data.len()
        );
        boot_files.push(path);
        by_index.push(id);
    }

    let mut commands = Vec::new();
    for index in 0..image.command_count()? {
        let cmd = image.command(index)?;
        if let Some(id) = by_index.get(cmd.file) {
            log::info!(
                "Bootstrap: startup command prio {} -> {} '{}'",
                cmd.priority,
                ns.path_of(*id)?,
                cmd.arguments
            );
        }
        commands.push(String::from(cmd.arguments));
    }

    Ok(BootstrapReport {
        version: String::from(image.version()?),
        arch: String::from(image.arch()?),
        machine: String::from(image.machine()?),
        ram,
        devices: image.device_count()?,
        boot_files,
        commands,
    })
}
