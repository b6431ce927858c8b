//! Boot image byte layout.
//!
//! Every field is a little-endian `u32` unless noted, and every offset is
//! relative to the first byte of the header.
//!
//! | Record  | Size | Fields                                              |
//! |---------|------|-----------------------------------------------------|
//! | header  | 60   | see [`ImageHeader`]                                 |
//! | command | 16   | type, prio (u16), priv (u16), file_off, cmd_off     |
//! | ram     | 8    | addr, size                                          |
//! | irq     | 8    | priv, shared                                        |
//! | device  | 16   | addr, size, access, name_off                        |
//! | file    | 16   | type, size, data_off, name_off                      |

use super::error::ImageError;

/// Type tag identifying a boot image.
pub const IMAGE_MAGIC: u32 = 0xCACF_CACF;

pub const COMMAND_SIZE: usize = 16;
pub const RAM_SIZE: usize = 8;
pub const IRQ_SIZE: usize = 8;
pub const DEVICE_SIZE: usize = 16;
pub const FILE_SIZE: usize = 16;

/// Read a little-endian `u32` at `at`.
pub(crate) fn read_u32(buf: &[u8], at: usize) -> Result<u32, ImageError> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ImageError::out_of_bounds("field"))
}

/// Read a little-endian `u16` at `at`.
pub(crate) fn read_u16(buf: &[u8], at: usize) -> Result<u16, ImageError> {
    buf.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| ImageError::out_of_bounds("field"))
}

/// Check that `count` records of `size` bytes at `offset` fit in `limit`.
///
/// Returns the start of the region.
pub(crate) fn check_region(
    offset: u32,
    count: u32,
    size: usize,
    limit: usize,
    region: &'static str,
) -> Result<usize, ImageError> {
    let start = offset as usize;
    let end = (count as usize)
        .checked_mul(size)
        .and_then(|len| start.checked_add(len))
        .ok_or_else(|| ImageError::out_of_bounds(region))?;
    if end > limit {
        return Err(ImageError::out_of_bounds(region));
    }
    Ok(start)
}

/// Kind of an embedded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    /// Executable program
    Exec,
    /// Shared library
    Lib,
    /// Plain object/data
    Obj,
    Unknown(u32),
}

impl FileType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => FileType::Exec,
            2 => FileType::Lib,
            3 => FileType::Obj,
            other => FileType::Unknown(other),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            FileType::Exec => 1,
            FileType::Lib => 2,
            FileType::Obj => 3,
            FileType::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileType::Exec => "exec",
            FileType::Lib => "lib",
            FileType::Obj => "obj",
            FileType::Unknown(_) => "unknown",
        }
    }
}

/// Fixed image header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageHeader {
    /// Type tag, must equal [`IMAGE_MAGIC`]
    pub magic: u32,
    /// String-table offset of the version string
    pub version: u32,
    /// String-table offset of the architecture string
    pub arch: u32,
    /// String-table offset of the machine string
    pub machine: u32,
    /// Total image size in bytes
    pub fs_size: u32,
    pub script_off: u32,
    pub script_cmds: u32,
    pub ram_off: u32,
    pub irq_off: u32,
    pub devices_off: u32,
    pub devices_count: u32,
    pub names_off: u32,
    pub names_size: u32,
    pub files_off: u32,
    pub files_count: u32,
}

impl ImageHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 60;

    fn fields(&self) -> [u32; 15] {
        [
            self.magic,
            self.version,
            self.arch,
            self.machine,
            self.fs_size,
            self.script_off,
            self.script_cmds,
            self.ram_off,
            self.irq_off,
            self.devices_off,
            self.devices_count,
            self.names_off,
            self.names_size,
            self.files_off,
            self.files_count,
        ]
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ImageError> {
        if buf.len() < Self::SIZE {
            return Err(ImageError::Truncated {
                needed: Self::SIZE,
                available: buf.len(),
            });
        }
        let f = |i: usize| read_u32(buf, i * 4);
        Ok(Self {
            magic: f(0)?,
            version: f(1)?,
            arch: f(2)?,
            machine: f(3)?,
            fs_size: f(4)?,
            script_off: f(5)?,
            script_cmds: f(6)?,
            ram_off: f(7)?,
            irq_off: f(8)?,
            devices_off: f(9)?,
            devices_count: f(10)?,
            names_off: f(11)?,
            names_size: f(12)?,
            files_off: f(13)?,
            files_count: f(14)?,
        })
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (i, value) in self.fields().iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_order() {
        let hdr = ImageHeader {
            magic: IMAGE_MAGIC,
            fs_size: 0x1234,
            files_count: 3,
            ..Default::default()
        };
        let bytes = hdr.encode();
        assert_eq!(&bytes[0..4], &[0xCF, 0xCA, 0xCF, 0xCA]);
        assert_eq!(read_u32(&bytes, 16).unwrap(), 0x1234);
        assert_eq!(read_u32(&bytes, 56).unwrap(), 3);
        assert_eq!(ImageHeader::decode(&bytes).unwrap(), hdr);
    }

    #[test]
    fn test_check_region_overflow() {
        assert!(check_region(10, 2, 16, 42, "files").is_ok());
        assert!(check_region(10, 2, 16, 41, "files").is_err());
        assert!(check_region(u32::MAX, u32::MAX, 16, u32::MAX as usize, "files").is_err());
    }

    #[test]
    fn test_file_type_round_trip_unknown() {
        assert_eq!(FileType::from_u32(1), FileType::Exec);
        assert_eq!(FileType::from_u32(9).as_u32(), 9);
    }
}
