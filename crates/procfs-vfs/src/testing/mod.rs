//! Test helpers: boot image builder and in-memory image source.

mod image_builder;

pub use image_builder::{ImageBuilder, MemoryImage};
