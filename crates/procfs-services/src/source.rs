//! Boot image sources backed by the host filesystem.

use std::fs;
use std::path::PathBuf;

use alloc::format;
use alloc::vec::Vec;
use procfs_vfs::{ImageError, ImageSource};

/// Reads the boot image from a file each time it is mapped.
#[derive(Clone, Debug)]
pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileImage {
    fn map(&mut self) -> Result<Vec<u8>, ImageError> {
        fs::read(&self.path)
            .map_err(|e| ImageError::map(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procfs_vfs::testing::ImageBuilder;

    #[test]
    fn test_missing_file_is_map_error() {
        let mut source = FileImage::new("/nonexistent/boot.img");
        assert!(matches!(source.map(), Err(ImageError::Map(_))));
    }

    #[test]
    fn test_reads_whole_file() {
        let blob = ImageBuilder::new("1", "arm", "m").build();
        let path = std::env::temp_dir().join(format!("procfs-image-{}.img", std::process::id()));
        fs::write(&path, &blob).unwrap();

        let mapped = FileImage::new(&path).map().unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(mapped, blob);
    }
}
