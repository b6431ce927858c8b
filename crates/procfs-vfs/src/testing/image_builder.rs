//! In-memory boot image construction.
//!
//! Lays tables out back to back after the header:
//!
//! ```text
//! header | commands | ram | irq | devices | files | strings | file data
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::image::{FileType, ImageError, ImageHeader, ImageSource, IMAGE_MAGIC};

struct BuilderFile {
    name: String,
    kind: FileType,
    data: Vec<u8>,
    size_override: Option<u32>,
}

struct BuilderCommand {
    file: String,
    priority: u16,
    privilege: u16,
    arguments: String,
}

/// Builds a valid boot image blob for tests.
pub struct ImageBuilder {
    magic: u32,
    version: String,
    arch: String,
    machine: String,
    ram: (u32, u32),
    irq: (u32, u32),
    devices: Vec<(String, u32, u32)>,
    files: Vec<BuilderFile>,
    commands: Vec<BuilderCommand>,
}

fn push_string(table: &mut Vec<u8>, s: &str) -> u32 {
    let offset = table.len() as u32;
    table.extend_from_slice(s.as_bytes());
    table.push(0);
    offset
}

fn push_words(out: &mut Vec<u8>, words: &[u32]) {
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
}

impl ImageBuilder {
    pub fn new(version: &str, arch: &str, machine: &str) -> Self {
        Self {
            magic: IMAGE_MAGIC,
            version: String::from(version),
            arch: String::from(arch),
            machine: String::from(machine),
            ram: (0, 0),
            irq: (0, 0),
            devices: Vec::new(),
            files: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn ram(mut self, addr: u32, size: u32) -> Self {
        self.ram = (addr, size);
        self
    }

    pub fn irq(mut self, privilege: u32, shared: u32) -> Self {
        self.irq = (privilege, shared);
        self
    }

    pub fn device(mut self, name: &str, addr: u32, size: u32) -> Self {
        self.devices.push((String::from(name), addr, size));
        self
    }

    pub fn file(mut self, name: &str, kind: FileType, data: Vec<u8>) -> Self {
        self.files.push(BuilderFile {
            name: String::from(name),
            kind,
            data,
            size_override: None,
        });
        self
    }

    /// Startup command running the embedded file called `file`.
    pub fn command(mut self, file: &str, priority: u16, privilege: u16, arguments: &str) -> Self {
        self.commands.push(BuilderCommand {
            file: String::from(file),
            priority,
            privilege,
            arguments: String::from(arguments),
        });
        self
    }

    /// Record a wrong size for file `index`, leaving its data in place.
    pub fn corrupt_file_size(mut self, index: usize, size: u32) -> Self {
        if let Some(file) = self.files.get_mut(index) {
            file.size_override = Some(size);
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut strings = Vec::new();
        let version = push_string(&mut strings, &self.version);
        let arch = push_string(&mut strings, &self.arch);
        let machine = push_string(&mut strings, &self.machine);
        let device_names: Vec<u32> = self
            .devices
            .iter()
            .map(|(name, _, _)| push_string(&mut strings, name))
            .collect();
        let file_names: Vec<u32> = self
            .files
            .iter()
            .map(|f| push_string(&mut strings, &f.name))
            .collect();
        let command_args: Vec<u32> = self
            .commands
            .iter()
            .map(|c| push_string(&mut strings, &c.arguments))
            .collect();

        let script_off = ImageHeader::SIZE as u32;
        let ram_off = script_off + 16 * self.commands.len() as u32;
        let irq_off = ram_off + 8;
        let devices_off = irq_off + 8;
        let files_off = devices_off + 16 * self.devices.len() as u32;
        let names_off = files_off + 16 * self.files.len() as u32;
        let data_off = names_off + strings.len() as u32;
        let data_len: usize = self.files.iter().map(|f| f.data.len()).sum();
        let fs_size = data_off + data_len as u32;

        let header = ImageHeader {
            magic: self.magic,
            version,
            arch,
            machine,
            fs_size,
            script_off,
            script_cmds: self.commands.len() as u32,
            ram_off,
            irq_off,
            devices_off,
            devices_count: self.devices.len() as u32,
            names_off,
            names_size: strings.len() as u32,
            files_off,
            files_count: self.files.len() as u32,
        };

        let mut out = Vec::with_capacity(fs_size as usize);
        out.extend_from_slice(&header.encode());

        for (cmd, args) in self.commands.iter().zip(&command_args) {
            let index = self
                .files
                .iter()
                .position(|f| f.name == cmd.file)
                .map_or(u32::MAX / 32, |i| i as u32);
            push_words(&mut out, &[1]);
            out.extend_from_slice(&cmd.priority.to_le_bytes());
            out.extend_from_slice(&cmd.privilege.to_le_bytes());
            push_words(&mut out, &[files_off.wrapping_add(index * 16), *args]);
        }
        push_words(&mut out, &[self.ram.0, self.ram.1, self.irq.0, self.irq.1]);
        for ((_, addr, size), name) in self.devices.iter().zip(&device_names) {
            push_words(&mut out, &[*addr, *size, 0x3, *name]);
        }
        let mut next_data = data_off;
        for (file, name) in self.files.iter().zip(&file_names) {
            let size = file.size_override.unwrap_or(file.data.len() as u32);
            push_words(&mut out, &[file.kind.as_u32(), size, next_data, *name]);
            next_data += file.data.len() as u32;
        }
        out.extend_from_slice(&strings);
        for file in &self.files {
            out.extend_from_slice(&file.data);
        }
        out
    }
}

/// Image source serving a fixed blob.
pub struct MemoryImage {
    blob: Option<Vec<u8>>,
}

impl MemoryImage {
    pub fn new(blob: Vec<u8>) -> Self {
        Self { blob: Some(blob) }
    }

    /// A source whose mapping always fails.
    pub fn unavailable() -> Self {
        Self { blob: None }
    }
}

impl ImageSource for MemoryImage {
    fn map(&mut self) -> Result<Vec<u8>, ImageError> {
        self.blob
            .clone()
            .ok_or_else(|| ImageError::map("no image present"))
    }
}
