//! Traits shared by everything that can be drawn or sampled.

use sprig_core::math::Transform2d;
use sprig_core::sampler::{Filter, Wrap};

use crate::backend::TextureHandle;
use crate::error::GraphicsError;
use crate::resources::Quad;

/// Something that can be drawn with a 2D transform.
pub trait Drawable {
    /// Draw with the given transform.
    fn draw(&self, transform: &Transform2d) -> Result<(), GraphicsError>;
}

/// A drawable that can also be bound as a texture by other drawables.
pub trait Texture: Drawable + Send + Sync {
    /// Logical width in pixels.
    fn width(&self) -> u32;

    /// Logical height in pixels.
    fn height(&self) -> u32;

    /// Current filter.
    fn filter(&self) -> Filter;

    /// Current wrap.
    fn wrap(&self) -> Wrap;

    /// Make sure the texture is on the GPU and return its handle.
    fn bind(&self) -> Result<TextureHandle, GraphicsError>;

    /// Draw the part of the texture selected by `quad`.
    fn drawq(&self, quad: &Quad, transform: &Transform2d) -> Result<(), GraphicsError>;
}

/// A resource whose GPU side can be dropped and rebuilt from CPU data.
///
/// Used to survive context loss: every live resource is unloaded, then
/// loaded again once a new context exists.
pub trait Volatile {
    /// Create the GPU side. Does nothing if already loaded.
    fn load_volatile(&self) -> Result<(), GraphicsError>;

    /// Release the GPU side, keeping CPU state.
    fn unload_volatile(&self);
}
