//! CPU-side texture sources.
//!
//! Provides [`ImageData`] for decoded RGBA8 pixels and [`CompressedData`]
//! for pre-compressed block data with an optional mipmap chain. Both are
//! immutable once built and are shared with `Arc` by the GPU images that
//! upload them.

mod compressed;
mod image_data;

pub use compressed::{CompressedData, CompressedFormat, CompressedLevel, CompressionFamily};
pub use image_data::ImageData;

use std::fmt;

/// Errors produced while building texture sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureDataError {
    /// Width or height is zero.
    ZeroSize,
    /// The byte length does not match the dimensions.
    SizeMismatch {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
    /// A compressed source has no levels.
    NoLevels,
}

impl fmt::Display for TextureDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "texture dimensions cannot be zero"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} bytes of texture data, got {actual}")
            }
            Self::NoLevels => write!(f, "compressed data must contain at least one level"),
        }
    }
}

impl std::error::Error for TextureDataError {}
