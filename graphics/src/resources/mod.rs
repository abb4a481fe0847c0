//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Buffer`] - Vertex or index storage with a CPU mirror
//! - [`Image`] - Texture uploaded from raw or compressed image data
//! - [`Quad`] - Sub-rectangle of a texture, drawn with [`Image::drawq`]
//!
//! Resources are reference-counted with [`Arc`] and can be shared across threads.
//! Each resource holds a weak reference back to its parent device.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`Arc`]: std::sync::Arc
//! [`Image::drawq`]: crate::Texture::drawq

mod buffer;
mod image;
mod quad;

pub use buffer::{Buffer, BufferFormat, BufferMapping};
pub use image::{Image, ImageSource};
pub use quad::{Quad, Viewport};
