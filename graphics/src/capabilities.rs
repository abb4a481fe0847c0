//! Driver capabilities.
//!
//! [`Capabilities`] is a plain value describing what the running driver can
//! do. Every capability-dependent branch in buffer, mesh and image code
//! consults it; nothing is queried from global state.

use bitflags::bitflags;
use sprig_core::texture::{CompressedFormat, CompressionFamily};

bitflags! {
    /// Compressed texture families supported by the driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompressionFamilies: u32 {
        /// DXT1, DXT3, DXT5.
        const S3TC = 1 << 0;
        /// BC5 signed and unsigned.
        const RGTC = 1 << 1;
        /// BC7 and BC7 sRGB.
        const BPTC = 1 << 2;
    }
}

impl Default for CompressionFamilies {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<CompressionFamily> for CompressionFamilies {
    fn from(family: CompressionFamily) -> Self {
        match family {
            CompressionFamily::S3tc => Self::S3TC,
            CompressionFamily::Rgtc => Self::RGTC,
            CompressionFamily::Bptc => Self::BPTC,
        }
    }
}

/// Capabilities reported by the graphics driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    /// Textures may have non-power-of-two dimensions.
    pub npot: bool,
    /// Some mipmap generation path exists (auto-generate flag or framebuffer path).
    pub mipmap_generation: bool,
    /// Mipmaps can be generated explicitly after upload.
    pub framebuffer_mipmap_generation: bool,
    /// Texture LOD bias is supported.
    pub lod_bias: bool,
    /// Maximum absolute LOD bias.
    pub max_lod_bias: f32,
    /// The driver can be told the highest valid mipmap level.
    pub texture_max_level: bool,
    /// Anisotropic filtering is supported.
    pub anisotropic_filtering: bool,
    /// Maximum anisotropy level.
    pub max_anisotropy: f32,
    /// Any compressed texture format is supported.
    pub texture_compression: bool,
    /// Supported compressed families.
    pub compression_families: CompressionFamilies,
    /// Instanced drawing is supported.
    pub instancing: bool,
    /// Maximum texture dimension.
    pub max_texture_size: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::modern()
    }
}

impl Capabilities {
    /// A current desktop driver.
    pub fn modern() -> Self {
        Self {
            npot: true,
            mipmap_generation: true,
            framebuffer_mipmap_generation: true,
            lod_bias: true,
            max_lod_bias: 16.0,
            texture_max_level: true,
            anisotropic_filtering: true,
            max_anisotropy: 16.0,
            texture_compression: true,
            compression_families: CompressionFamilies::all(),
            instancing: true,
            max_texture_size: 16384,
        }
    }

    /// An old driver: power-of-two textures only, auto-generated mipmaps,
    /// no compression, no LOD bias and no max-level query.
    pub fn legacy() -> Self {
        Self {
            npot: false,
            mipmap_generation: true,
            framebuffer_mipmap_generation: false,
            lod_bias: false,
            max_lod_bias: 0.0,
            texture_max_level: false,
            anisotropic_filtering: false,
            max_anisotropy: 1.0,
            texture_compression: false,
            compression_families: CompressionFamilies::empty(),
            instancing: false,
            max_texture_size: 2048,
        }
    }

    /// Set whether non-power-of-two textures are supported.
    pub fn with_npot(mut self, npot: bool) -> Self {
        self.npot = npot;
        self
    }

    /// Set whether mipmaps can be generated at all.
    pub fn with_mipmap_generation(mut self, supported: bool) -> Self {
        self.mipmap_generation = supported;
        if !supported {
            self.framebuffer_mipmap_generation = false;
        }
        self
    }

    /// Set LOD bias support and its maximum.
    pub fn with_lod_bias(mut self, max_lod_bias: Option<f32>) -> Self {
        self.lod_bias = max_lod_bias.is_some();
        self.max_lod_bias = max_lod_bias.unwrap_or(0.0);
        self
    }

    /// Set whether the max mipmap level can be specified.
    pub fn with_texture_max_level(mut self, supported: bool) -> Self {
        self.texture_max_level = supported;
        self
    }

    /// Set the supported compressed families.
    pub fn with_compression(mut self, families: CompressionFamilies) -> Self {
        self.texture_compression = !families.is_empty();
        self.compression_families = families;
        self
    }

    /// Set the maximum anisotropy (1.0 disables anisotropic filtering).
    pub fn with_max_anisotropy(mut self, max: f32) -> Self {
        self.anisotropic_filtering = max > 1.0;
        self.max_anisotropy = max.max(1.0);
        self
    }

    /// Set whether instanced drawing is supported.
    pub fn with_instancing(mut self, supported: bool) -> Self {
        self.instancing = supported;
        self
    }

    /// Set the maximum texture dimension.
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Non-power-of-two textures are supported.
    pub fn has_npot(&self) -> bool {
        self.npot
    }

    /// Mipmaps can be generated for raw images.
    pub fn has_mipmap_support(&self) -> bool {
        self.mipmap_generation
    }

    /// Mipmap sharpness (LOD bias) is supported.
    pub fn has_mipmap_sharpness_support(&self) -> bool {
        self.lod_bias
    }

    /// Anisotropic filtering is supported.
    pub fn has_anisotropic_filtering_support(&self) -> bool {
        self.anisotropic_filtering
    }

    /// Any compressed texture format is supported.
    pub fn has_compressed_texture_support(&self) -> bool {
        self.texture_compression
    }

    /// The given compressed format can be uploaded.
    pub fn has_compressed_format_support(&self, format: CompressedFormat) -> bool {
        self.texture_compression
            && self
                .compression_families
                .contains(CompressionFamilies::from(format.family()))
    }

    /// Instanced drawing is supported.
    pub fn has_instancing_support(&self) -> bool {
        self.instancing
    }
}
