//! Pre-compressed block texture data.

use std::fmt;

use super::TextureDataError;

/// Block compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    /// BC1 / DXT1 RGB.
    Dxt1,
    /// BC2 / DXT3 RGBA.
    Dxt3,
    /// BC3 / DXT5 RGBA.
    Dxt5,
    /// BC5 signed two-channel.
    Bc5s,
    /// BC5 unsigned two-channel.
    Bc5u,
    /// BC7 RGBA.
    Bc7,
    /// BC7 RGBA, sRGB.
    Bc7Srgb,
}

/// Hardware extension family a compressed format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionFamily {
    /// S3 texture compression (DXT1/3/5).
    S3tc,
    /// Red-green texture compression (BC5).
    Rgtc,
    /// Block partitioned texture compression (BC7).
    Bptc,
}

impl CompressedFormat {
    /// Bytes per 4x4 block.
    pub fn block_size(&self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 | Self::Bc5s | Self::Bc5u | Self::Bc7 | Self::Bc7Srgb => 16,
        }
    }

    /// Extension family required to sample this format.
    pub fn family(&self) -> CompressionFamily {
        match self {
            Self::Dxt1 | Self::Dxt3 | Self::Dxt5 => CompressionFamily::S3tc,
            Self::Bc5s | Self::Bc5u => CompressionFamily::Rgtc,
            Self::Bc7 | Self::Bc7Srgb => CompressionFamily::Bptc,
        }
    }

    /// Short lower-case name, e.g. `"dxt5"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dxt1 => "dxt1",
            Self::Dxt3 => "dxt3",
            Self::Dxt5 => "dxt5",
            Self::Bc5s => "bc5s",
            Self::Bc5u => "bc5u",
            Self::Bc7 => "bc7",
            Self::Bc7Srgb => "bc7srgb",
        }
    }

    /// Byte length of one level with the given dimensions.
    pub fn level_size(&self, width: u32, height: u32) -> usize {
        let blocks_x = width.div_ceil(4).max(1) as usize;
        let blocks_y = height.div_ceil(4).max(1) as usize;
        blocks_x * blocks_y * self.block_size()
    }
}

impl fmt::Display for CompressedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One mipmap level of compressed data.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedLevel {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Block bytes.
    pub data: Vec<u8>,
}

impl fmt::Debug for CompressedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedLevel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Compressed texture data with one or more mipmap levels.
///
/// Level 0 is the base image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    format: CompressedFormat,
    levels: Vec<CompressedLevel>,
}

impl CompressedData {
    /// Validate and wrap compressed levels.
    pub fn new(
        format: CompressedFormat,
        levels: Vec<CompressedLevel>,
    ) -> Result<Self, TextureDataError> {
        if levels.is_empty() {
            return Err(TextureDataError::NoLevels);
        }
        for level in &levels {
            if level.width == 0 || level.height == 0 {
                return Err(TextureDataError::ZeroSize);
            }
            let expected = format.level_size(level.width, level.height);
            if level.data.len() != expected {
                return Err(TextureDataError::SizeMismatch {
                    expected,
                    actual: level.data.len(),
                });
            }
        }
        Ok(Self { format, levels })
    }

    /// Compression format.
    pub fn format(&self) -> CompressedFormat {
        self.format
    }

    /// Number of mipmap levels, including the base.
    pub fn mipmap_count(&self) -> usize {
        self.levels.len()
    }

    /// Get a level.
    pub fn level(&self, index: usize) -> Option<&CompressedLevel> {
        self.levels.get(index)
    }

    /// All levels, base first.
    pub fn levels(&self) -> &[CompressedLevel] {
        &self.levels
    }

    /// Width of the base level.
    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    /// Height of the base level.
    pub fn height(&self) -> u32 {
        self.levels[0].height
    }
}
