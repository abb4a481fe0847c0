//! # Sprig Graphics
//!
//! Meshes and images for a 2D drawing API, on top of an abstract GPU backend.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Creates and tracks GPU resources
//! - [`Mesh`] - Vertex attributes from one or more buffers, drawn with an
//!   optional vertex map, draw range and instancing
//! - [`Image`] - Texture lifecycle with power-of-two padding, compressed
//!   formats, mipmaps, filtering, wrapping and sharpness
//! - [`GpuBackend`] - Trait for graphics backend implementations, with a
//!   recording [`DummyBackend`] for tests
//! - [`Capabilities`] - What the backend supports, queried instead of globals
//!
//! ## Example
//!
//! ```ignore
//! use sprig_graphics::{Capabilities, DummyBackend, GraphicsConfig, GraphicsDevice};
//!
//! let backend = Arc::new(DummyBackend::new(Capabilities::legacy()));
//! let device = GraphicsDevice::new(backend, Capabilities::legacy(), GraphicsConfig::default());
//! let image = device.create_image(ImageData::zeroed(100, 50)?.into())?;
//! assert_eq!(image.padded_size(), (128, 64));
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod device;
pub mod drawable;
pub mod error;
pub mod mesh;
pub mod resources;
pub mod types;

// Re-export main types for convenience
#[cfg(feature = "dummy")]
pub use backend::DummyBackend;
pub use backend::{BackendError, DrawCommand, GpuBackend};
pub use capabilities::{Capabilities, CompressionFamilies};
pub use config::GraphicsConfig;
pub use device::GraphicsDevice;
pub use drawable::{Drawable, Texture, Volatile};
pub use error::{ErrorKind, GraphicsError};
pub use mesh::{BufferAttribute, Mesh};
pub use resources::{Buffer, BufferFormat, BufferMapping, Image, ImageSource, Quad, Viewport};
pub use types::{BufferDescriptor, BufferUsage, TexturedVertex};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    sprig_core::init();
    log::info!("Sprig Graphics v{} initialized", VERSION);
}
