//! Boot image errors.

use alloc::string::String;

/// Errors from mapping, parsing or querying the boot image.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// `init` called while an image is still mapped.
    #[error("boot image already mapped")]
    AlreadyMapped,

    /// Operation needs a mapped image.
    #[error("boot image not mapped")]
    NotMapped,

    /// Query issued before a successful `parse`.
    #[error("boot image not parsed")]
    NotParsed,

    /// Header type tag is not the boot image magic.
    #[error("bad image magic {0:#x}")]
    BadMagic(u32),

    /// Blob shorter than the header or the size it declares.
    #[error("image truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// A table or data region extends past the end of the image.
    #[error("{region} lies outside the image")]
    OutOfBounds { region: &'static str },

    /// A string-table offset is out of range, unterminated or not UTF-8.
    #[error("bad string at offset {0:#x}")]
    BadString(u32),

    /// Index past the end of a table.
    #[error("{table} index {index} out of range")]
    IndexOutOfRange { table: &'static str, index: usize },

    /// The image source failed.
    #[error("failed to map boot image: {0}")]
    Map(String),
}

impl ImageError {
    pub fn map(msg: impl Into<String>) -> Self {
        Self::Map(msg.into())
    }

    pub(crate) fn out_of_bounds(region: &'static str) -> Self {
        Self::OutOfBounds { region }
    }
}
