//! Boot Image Parser
//!
//! Reads the packed "raw filesystem" blob the loader hands to the proc
//! server: a fixed header followed by offset tables describing RAM,
//! interrupts, devices, startup commands and embedded files.
//!
//! # Lifecycle
//!
//! ```text
//!   Unmapped ──init──► Mapped ──parse──► Parsed
//!      ▲                  │                 │
//!      └──────delete──────┴──────delete─────┘
//! ```
//!
//! At most one image is mapped at a time. Every table, string and file
//! region is bounds-checked during `parse`, so accessors on a parsed image
//! never read outside the blob. Queries before `parse` or after `delete`
//! return [`ImageError::NotParsed`].

mod error;
mod layout;

pub use error::ImageError;
pub use layout::{FileType, ImageHeader, IMAGE_MAGIC};

use alloc::vec::Vec;
use layout::{
    check_region, read_u16, read_u32, COMMAND_SIZE, DEVICE_SIZE, FILE_SIZE, IRQ_SIZE, RAM_SIZE,
};

/// Provider of the raw image bytes.
pub trait ImageSource {
    /// Produce the image. Called once per `init`.
    fn map(&mut self) -> Result<Vec<u8>, ImageError>;
}

/// RAM descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RamInfo {
    pub addr: u32,
    pub size: u32,
}

/// Interrupt descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IrqInfo {
    pub privilege: u32,
    pub shared: u32,
}

/// One device table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Device<'a> {
    pub name: &'a str,
    pub addr: u32,
    pub size: u32,
    pub access: u32,
}

/// One embedded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmbeddedFile<'a> {
    pub name: &'a str,
    pub kind: FileType,
    pub data: &'a [u8],
}

/// One startup command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartupCommand<'a> {
    pub kind: u32,
    pub priority: u16,
    pub privilege: u16,
    /// Index into the embedded file table
    pub file: usize,
    pub arguments: &'a str,
}

#[derive(Default)]
enum State {
    #[default]
    Unmapped,
    Mapped(Vec<u8>),
    Parsed {
        blob: Vec<u8>,
        header: ImageHeader,
    },
}

/// The boot image, from mapping to release.
#[derive(Default)]
pub struct BootImage {
    state: State,
}

impl BootImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mapped(&self) -> bool {
        !matches!(self.state, State::Unmapped)
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.state, State::Parsed { .. })
    }

    /// Map the image from `source`.
    ///
    /// Fails with `AlreadyMapped` if an image is still held.
    pub fn init(&mut self, source: &mut dyn ImageSource) -> Result<(), ImageError> {
        if self.is_mapped() {
            return Err(ImageError::AlreadyMapped);
        }
        let blob = source.map()?;
        log::debug!("BootImage: mapped {} bytes", blob.len());
        self.state = State::Mapped(blob);
        Ok(())
    }

    /// Validate the header and every region it references.
    pub fn parse(&mut self) -> Result<&ImageHeader, ImageError> {
        let blob = match core::mem::take(&mut self.state) {
            State::Unmapped => return Err(ImageError::NotMapped),
            State::Mapped(blob) | State::Parsed { blob, .. } => blob,
        };
        match validate(&blob) {
            Ok(header) => {
                self.state = State::Parsed { blob, header };
                self.header()
            }
            Err(e) => {
                self.state = State::Mapped(blob);
                Err(e)
            }
        }
    }

    /// Release the image.
    pub fn delete(&mut self) -> Result<(), ImageError> {
        if !self.is_mapped() {
            return Err(ImageError::NotMapped);
        }
        self.state = State::Unmapped;
        log::debug!("BootImage: released");
        Ok(())
    }

    fn parsed(&self) -> Result<(&[u8], &ImageHeader), ImageError> {
        match &self.state {
            State::Parsed { blob, header } => Ok((blob.as_slice(), header)),
            _ => Err(ImageError::NotParsed),
        }
    }

    pub fn header(&self) -> Result<&ImageHeader, ImageError> {
        self.parsed().map(|(_, h)| h)
    }

    /// Resolve a string-table offset.
    pub fn string(&self, offset: u32) -> Result<&str, ImageError> {
        let (blob, header) = self.parsed()?;
        read_string(blob, header, offset)
    }

    pub fn version(&self) -> Result<&str, ImageError> {
        self.string(self.header()?.version)
    }

    pub fn arch(&self) -> Result<&str, ImageError> {
        self.string(self.header()?.arch)
    }

    pub fn machine(&self) -> Result<&str, ImageError> {
        self.string(self.header()?.machine)
    }

    pub fn ram(&self) -> Result<RamInfo, ImageError> {
        let (blob, header) = self.parsed()?;
        let at = header.ram_off as usize;
        Ok(RamInfo {
            addr: read_u32(blob, at)?,
            size: read_u32(blob, at + 4)?,
        })
    }

    pub fn irq(&self) -> Result<IrqInfo, ImageError> {
        let (blob, header) = self.parsed()?;
        let at = header.irq_off as usize;
        Ok(IrqInfo {
            privilege: read_u32(blob, at)?,
            shared: read_u32(blob, at + 4)?,
        })
    }

    pub fn device_count(&self) -> Result<usize, ImageError> {
        Ok(self.header()?.devices_count as usize)
    }

    pub fn device(&self, index: usize) -> Result<Device<'_>, ImageError> {
        let (blob, header) = self.parsed()?;
        let at = record(header.devices_off, header.devices_count, DEVICE_SIZE, index, "device")?;
        Ok(Device {
            addr: read_u32(blob, at)?,
            size: read_u32(blob, at + 4)?,
            access: read_u32(blob, at + 8)?,
            name: read_string(blob, header, read_u32(blob, at + 12)?)?,
        })
    }

    pub fn file_count(&self) -> Result<usize, ImageError> {
        Ok(self.header()?.files_count as usize)
    }

    pub fn file(&self, index: usize) -> Result<EmbeddedFile<'_>, ImageError> {
        let (blob, header) = self.parsed()?;
        read_file(blob, header, index)
    }

    pub fn command_count(&self) -> Result<usize, ImageError> {
        Ok(self.header()?.script_cmds as usize)
    }

    pub fn command(&self, index: usize) -> Result<StartupCommand<'_>, ImageError> {
        let (blob, header) = self.parsed()?;
        read_command(blob, header, index)
    }

    /// Log the header at debug level.
    pub fn dump_header(&self) -> Result<(), ImageError> {
        let header = self.header()?;
        log::debug!("BootImage: header");
        log::debug!("BootImage:  - Type:    {:#x}", header.magic);
        log::debug!("BootImage:  - Version: {}", self.version()?);
        log::debug!("BootImage:  - Arch:    {}", self.arch()?);
        log::debug!("BootImage:  - Mach:    {}", self.machine()?);
        log::debug!("BootImage:  - Size:    {:#x}", header.fs_size);
        Ok(())
    }
}

// =============================================================================
// Decoding helpers
// =============================================================================

fn record(
    offset: u32,
    count: u32,
    size: usize,
    index: usize,
    table: &'static str,
) -> Result<usize, ImageError> {
    if index >= count as usize {
        return Err(ImageError::IndexOutOfRange { table, index });
    }
    Ok(offset as usize + index * size)
}

fn read_string<'a>(blob: &'a [u8], header: &ImageHeader, offset: u32) -> Result<&'a str, ImageError> {
    if offset >= header.names_size {
        return Err(ImageError::BadString(offset));
    }
    let start = header.names_off as usize + offset as usize;
    let end = header.names_off as usize + header.names_size as usize;
    let table = blob.get(start..end).ok_or(ImageError::BadString(offset))?;
    let len = table
        .iter()
        .position(|&b| b == 0)
        .ok_or(ImageError::BadString(offset))?;
    core::str::from_utf8(&table[..len]).map_err(|_| ImageError::BadString(offset))
}

fn read_file<'a>(blob: &'a [u8], header: &ImageHeader, index: usize) -> Result<EmbeddedFile<'a>, ImageError> {
    let at = record(header.files_off, header.files_count, FILE_SIZE, index, "file")?;
    let kind = FileType::from_u32(read_u32(blob, at)?);
    let size = read_u32(blob, at + 4)?;
    let data_off = read_u32(blob, at + 8)?;
    let name = read_string(blob, header, read_u32(blob, at + 12)?)?;
    let start = check_region(data_off, size, 1, header.fs_size as usize, "file data")?;
    Ok(EmbeddedFile {
        name,
        kind,
        data: &blob[start..start + size as usize],
    })
}

fn read_command<'a>(
    blob: &'a [u8],
    header: &ImageHeader,
    index: usize,
) -> Result<StartupCommand<'a>, ImageError> {
    let at = record(header.script_off, header.script_cmds, COMMAND_SIZE, index, "command")?;
    let file_off = read_u32(blob, at + 8)?;
    let rel = file_off
        .checked_sub(header.files_off)
        .filter(|rel| *rel as usize % FILE_SIZE == 0)
        .ok_or_else(|| ImageError::out_of_bounds("command file reference"))?;
    let file = rel as usize / FILE_SIZE;
    if file >= header.files_count as usize {
        return Err(ImageError::out_of_bounds("command file reference"));
    }
    Ok(StartupCommand {
        kind: read_u32(blob, at)?,
        priority: read_u16(blob, at + 4)?,
        privilege: read_u16(blob, at + 6)?,
        file,
        arguments: read_string(blob, header, read_u32(blob, at + 12)?)?,
    })
}

/// Check the header and every region reachable from it.
fn validate(blob: &[u8]) -> Result<ImageHeader, ImageError> {
    let header = ImageHeader::decode(blob)?;
    if header.magic != IMAGE_MAGIC {
        return Err(ImageError::BadMagic(header.magic));
    }
    let size = header.fs_size as usize;
    if size < ImageHeader::SIZE || size > blob.len() {
        return Err(ImageError::Truncated {
            needed: size.max(ImageHeader::SIZE),
            available: blob.len(),
        });
    }

    check_region(header.ram_off, 1, RAM_SIZE, size, "ram descriptor")?;
    check_region(header.irq_off, 1, IRQ_SIZE, size, "irq descriptor")?;
    check_region(header.names_off, header.names_size, 1, size, "string table")?;
    check_region(header.devices_off, header.devices_count, DEVICE_SIZE, size, "device table")?;
    check_region(header.files_off, header.files_count, FILE_SIZE, size, "file table")?;
    check_region(header.script_off, header.script_cmds, COMMAND_SIZE, size, "command table")?;

    for offset in [header.version, header.arch, header.machine] {
        read_string(blob, &header, offset)?;
    }
    for index in 0..header.devices_count as usize {
        let at = record(header.devices_off, header.devices_count, DEVICE_SIZE, index, "device")?;
        read_string(blob, &header, read_u32(blob, at + 12)?)?;
    }
    for index in 0..header.files_count as usize {
        read_file(blob, &header, index)?;
    }
    for index in 0..header.script_cmds as usize {
        read_command(blob, &header, index)?;
    }
    Ok(header)
}
