//! Server configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! { "server_path": "/proc", "buffer_size": 2048, "max_file_size": 16777216 }
//! ```

use alloc::format;
use alloc::string::String;
use procfs_dispatch::ServerContext;
use procfs_ipc::{IoHeader, MSG_BUFFER_SIZE, PAGE_SIZE, SERVER_PATH};
use procfs_vfs::BootstrapLayout;
use serde::{Deserialize, Serialize};

/// Largest size a file may be truncated to (16 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Configuration errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one proc server instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path the server registers under
    pub server_path: String,

    /// Message buffer size in bytes
    pub buffer_size: usize,

    /// Dispatch workers; only 1 is supported
    pub workers: usize,

    /// Truncate rounds sizes up to a multiple of this
    pub page_size: usize,

    /// Upper bound for truncate
    pub max_file_size: u64,

    pub sys_path: String,
    pub devices_path: String,
    pub boot_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let layout = BootstrapLayout::default();
        Self {
            server_path: String::from(SERVER_PATH),
            buffer_size: MSG_BUFFER_SIZE,
            workers: 1,
            page_size: PAGE_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sys_path: layout.sys_path,
            devices_path: layout.devices_path,
            boot_dir: layout.boot_dir,
        }
    }
}

impl ServerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: ServerConfig =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(format!("{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // The namespace and connection table are not locked; a second
        // worker would race on them.
        if self.workers != 1 {
            return Err(ConfigError::Invalid(format!(
                "workers must be 1, got {}",
                self.workers
            )));
        }
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "page_size {} is not a power of two",
                self.page_size
            )));
        }
        if self.buffer_size < IoHeader::SIZE {
            return Err(ConfigError::Invalid(format!(
                "buffer_size {} is smaller than the {}-byte header",
                self.buffer_size,
                IoHeader::SIZE
            )));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Invalid(String::from("max_file_size must be non-zero")));
        }
        for (field, path) in [
            ("server_path", &self.server_path),
            ("sys_path", &self.sys_path),
            ("devices_path", &self.devices_path),
            ("boot_dir", &self.boot_dir),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} '{}' must start with '/'",
                    field, path
                )));
            }
        }
        Ok(())
    }

    /// Runtime view of this config.
    pub fn context(&self) -> ServerContext {
        ServerContext {
            path: self.server_path.clone(),
            buffer_size: self.buffer_size,
            workers: self.workers,
        }
    }

    /// Where the bootstrap places `/sys`, `/devices` and the boot files.
    pub fn layout(&self) -> BootstrapLayout {
        BootstrapLayout {
            sys_path: self.sys_path.clone(),
            devices_path: self.devices_path.clone(),
            boot_dir: self.boot_dir.clone(),
        }
    }
}
