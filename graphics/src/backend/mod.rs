//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction for GPU backends so the
//! resource code never talks to a driver directly.
//!
//! # Available Backends
//!
//! - `dummy` (default): records state and draw calls in memory, for testing
//!   and headless development
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Buffer creation, updates and destruction
//! - Texture creation, sampler state, level allocation and uploads
//! - Mipmap generation
//! - Deferred error retrieval after uploads
//! - Draw submission
//!
//! Texture operations follow the driver model where a call does not fail
//! immediately; errors are collected and retrieved with
//! [`GpuBackend::take_error`] once the upload sequence is done.

#[cfg(feature = "dummy")]
pub mod dummy;
mod error;

use std::num::NonZeroU32;

use sprig_core::math::Mat4;
use sprig_core::mesh::{IndexFormat, PrimitiveTopology, VertexAttributeFormat, VertexStepMode};
use sprig_core::sampler::{Filter, Wrap};
use sprig_core::texture::CompressedFormat;

use crate::types::{BufferDescriptor, TexturedVertex};

#[cfg(feature = "dummy")]
pub use dummy::{DummyBackend, TextureInfo};
pub use error::BackendError;

/// Handle to a GPU buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(NonZeroU32);

impl BufferHandle {
    /// Wrap a raw backend id.
    pub fn new(id: NonZeroU32) -> Self {
        Self(id)
    }

    /// Raw backend id.
    pub fn id(&self) -> u32 {
        self.0.get()
    }
}

/// Handle to a GPU texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    /// Wrap a raw backend id.
    pub fn new(id: NonZeroU32) -> Self {
        Self(id)
    }

    /// Raw backend id.
    pub fn id(&self) -> u32 {
        self.0.get()
    }
}

/// A rectangle inside one level of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRegion {
    /// Mipmap level.
    pub level: u32,
    /// Left edge in texels.
    pub x: u32,
    /// Top edge in texels.
    pub y: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl TextureRegion {
    /// Region covering `width` x `height` texels from the origin of `level`.
    pub fn new(level: u32, width: u32, height: u32) -> Self {
        Self {
            level,
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// One vertex attribute bound for a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBinding {
    /// Attribute name as seen by the shader.
    pub name: String,
    /// Source buffer.
    pub buffer: BufferHandle,
    /// Byte offset of the attribute inside one element.
    pub offset: usize,
    /// Bytes between consecutive elements.
    pub stride: usize,
    /// Attribute format.
    pub format: VertexAttributeFormat,
    /// Step rate.
    pub step_mode: VertexStepMode,
}

/// Index buffer bound for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBinding {
    /// Source buffer.
    pub buffer: BufferHandle,
    /// Index width.
    pub format: IndexFormat,
}

/// A draw of a vertex-buffer-backed mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    /// World transform.
    pub transform: Mat4,
    /// How vertices are assembled.
    pub topology: PrimitiveTopology,
    /// Bound texture, if any.
    pub texture: Option<TextureHandle>,
    /// Active attributes.
    pub attributes: Vec<AttributeBinding>,
    /// Index buffer, when drawing through a vertex map.
    pub indices: Option<IndexBinding>,
    /// First vertex, or first index when indexed.
    pub first: u32,
    /// Number of vertices, or indices when indexed.
    pub count: u32,
    /// Number of instances.
    pub instance_count: u32,
}

/// A draw of one textured quad.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadDraw {
    /// World transform.
    pub transform: Mat4,
    /// Bound texture.
    pub texture: TextureHandle,
    /// Corners in fan order.
    pub vertices: [TexturedVertex; 4],
}

/// A draw submitted to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Mesh draw.
    Mesh(MeshDraw),
    /// Textured quad draw.
    Quad(QuadDraw),
}

impl DrawCommand {
    /// Texture bound by this draw, if any.
    pub fn texture(&self) -> Option<TextureHandle> {
        match self {
            Self::Mesh(draw) => draw.texture,
            Self::Quad(draw) => Some(draw.texture),
        }
    }
}

/// Operations a GPU backend provides.
///
/// All methods take `&self`; implementations serialise access internally.
/// Texture calls record failures instead of returning them, which callers
/// collect with [`GpuBackend::take_error`].
pub trait GpuBackend: Send + Sync + 'static {
    /// Backend name.
    fn name(&self) -> &str;

    /// Create a buffer, optionally with initial contents.
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<BufferHandle, BackendError>;

    /// Write bytes into a buffer at `offset`.
    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8])
    -> Result<(), BackendError>;

    /// Destroy a buffer. Unknown handles are ignored.
    fn destroy_buffer(&self, buffer: BufferHandle);

    /// Create an empty texture object.
    fn create_texture(&self, label: Option<&str>) -> Result<TextureHandle, BackendError>;

    /// Destroy a texture. Unknown handles are ignored.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Apply filter state and return the anisotropy actually granted.
    fn set_texture_filter(&self, texture: TextureHandle, filter: &Filter) -> f32;

    /// Apply wrap state.
    fn set_texture_wrap(&self, texture: TextureHandle, wrap: &Wrap);

    /// Set the mipmap LOD bias.
    fn set_texture_lod_bias(&self, texture: TextureHandle, bias: f32);

    /// Set the highest mipmap level the sampler may use. `None` restores the
    /// driver default.
    fn set_texture_max_level(&self, texture: TextureHandle, level: Option<u32>);

    /// Regenerate mipmaps automatically whenever level 0 changes.
    fn set_texture_auto_mipmaps(&self, texture: TextureHandle, enabled: bool);

    /// Allocate RGBA8 storage for a level, optionally filling it.
    fn allocate_texture(
        &self,
        texture: TextureHandle,
        level: u32,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    );

    /// Upload RGBA8 texels into an allocated level.
    fn write_texture_region(&self, texture: TextureHandle, region: TextureRegion, data: &[u8]);

    /// Allocate and fill one level with compressed blocks.
    fn upload_compressed_level(
        &self,
        texture: TextureHandle,
        format: CompressedFormat,
        region: TextureRegion,
        data: &[u8],
    );

    /// Generate the full mipmap chain from level 0.
    fn generate_mipmaps(&self, texture: TextureHandle);

    /// Take the first error recorded since the last call.
    fn take_error(&self) -> Option<BackendError>;

    /// Submit a draw.
    fn submit_draw(&self, command: DrawCommand) -> Result<(), BackendError>;
}
