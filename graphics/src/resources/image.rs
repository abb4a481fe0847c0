//! GPU image resource.
//!
//! An [`Image`] uploads a raw or compressed source to a texture and keeps the
//! sampler state (filter, wrap, mipmap sharpness) mirrored on the CPU, so the
//! texture can be rebuilt with identical state after a context loss.
//!
//! # Upload paths
//!
//! - Drivers with non-power-of-two support get a texture of the exact source
//!   size, with texture coordinates spanning `[0, 1]`.
//! - Power-of-two-only drivers get a texture padded to the next power of two
//!   on each axis. The source is uploaded into the top-left corner and the
//!   texture coordinates are scaled to `size / padded_size`. Compressed
//!   sources cannot be padded and are rejected.
//!
//! # Mipmaps
//!
//! Mipmaps are created lazily, the first time a filter with a mipmap mode is
//! active while the image is loaded. Raw sources must have power-of-two
//! dimensions. Compressed sources upload their own chain; if the driver
//! cannot be told where the chain ends, the chain must reach 1x1.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use sprig_core::math::Transform2d;
use sprig_core::sampler::{Filter, Wrap};
use sprig_core::texture::{CompressedData, ImageData};

use crate::backend::{DrawCommand, GpuBackend, QuadDraw, TextureHandle, TextureRegion};
use crate::capabilities::Capabilities;
use crate::device::GraphicsDevice;
use crate::drawable::{Drawable, Texture, Volatile};
use crate::error::GraphicsError;
use crate::resources::Quad;
use crate::types::TexturedVertex;

/// Sharpness is kept this far inside the driver's LOD bias range.
const SHARPNESS_EPSILON: f32 = 0.01;

/// Source data of an [`Image`], retained for reloads.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Decoded RGBA8 pixels.
    Raw(Arc<ImageData>),
    /// Pre-compressed blocks with one or more levels.
    Compressed(Arc<CompressedData>),
}

impl ImageSource {
    /// Width of the base level.
    pub fn width(&self) -> u32 {
        match self {
            Self::Raw(data) => data.width(),
            Self::Compressed(data) => data.width(),
        }
    }

    /// Height of the base level.
    pub fn height(&self) -> u32 {
        match self {
            Self::Raw(data) => data.height(),
            Self::Compressed(data) => data.height(),
        }
    }

    /// Check if the source is compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

impl From<ImageData> for ImageSource {
    fn from(data: ImageData) -> Self {
        Self::Raw(Arc::new(data))
    }
}

impl From<CompressedData> for ImageSource {
    fn from(data: CompressedData) -> Self {
        Self::Compressed(Arc::new(data))
    }
}

#[derive(Debug)]
struct ImageState {
    texture: Option<TextureHandle>,
    filter: Filter,
    wrap: Wrap,
    mipmap_sharpness: f32,
    mipmaps_created: bool,
    vertices: [TexturedVertex; 4],
}

/// A texture created from image data.
///
/// Images are created by [`GraphicsDevice::create_image`] and loaded
/// immediately. All state is behind a lock so images can be shared with
/// `Arc` and bound by meshes.
pub struct Image {
    device: Weak<GraphicsDevice>,
    backend: Arc<dyn GpuBackend>,
    capabilities: Capabilities,
    source: ImageSource,
    width: u32,
    height: u32,
    state: Mutex<ImageState>,
}

impl Image {
    /// Create an unloaded image (called by GraphicsDevice).
    pub(crate) fn new(device: &Arc<GraphicsDevice>, source: ImageSource) -> Self {
        let capabilities = *device.capabilities();
        let config = device.config();
        let (width, height) = (source.width(), source.height());
        let (padded_width, padded_height) = padded_size(&capabilities, width, height);

        Self {
            device: Arc::downgrade(device),
            backend: Arc::clone(device.backend()),
            capabilities,
            source,
            width,
            height,
            state: Mutex::new(ImageState {
                texture: None,
                filter: config.initial_filter(),
                wrap: config.default_wrap,
                mipmap_sharpness: clamp_sharpness(&capabilities, config.default_mipmap_sharpness),
                mipmaps_created: false,
                vertices: corner_vertices(width, height, padded_width, padded_height),
            }),
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the retained source.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Raw pixel source, if not compressed.
    pub fn data(&self) -> Option<&Arc<ImageData>> {
        match &self.source {
            ImageSource::Raw(data) => Some(data),
            ImageSource::Compressed(_) => None,
        }
    }

    /// Compressed source, if compressed.
    pub fn compressed_data(&self) -> Option<&Arc<CompressedData>> {
        match &self.source {
            ImageSource::Compressed(data) => Some(data),
            ImageSource::Raw(_) => None,
        }
    }

    /// Check if the source is compressed.
    pub fn is_compressed(&self) -> bool {
        self.source.is_compressed()
    }

    /// Size of the GPU texture, which is padded on power-of-two-only drivers.
    pub fn padded_size(&self) -> (u32, u32) {
        padded_size(&self.capabilities, self.width, self.height)
    }

    /// Check if the texture is on the GPU.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().texture.is_some()
    }

    /// GPU handle, or `None` while unloaded.
    pub fn handle(&self) -> Option<TextureHandle> {
        self.state.lock().texture
    }

    /// Check if a mipmap chain exists on the GPU.
    pub fn mipmaps_created(&self) -> bool {
        self.state.lock().mipmaps_created
    }

    /// Corners of the whole image, in fan order.
    pub fn vertices(&self) -> [TexturedVertex; 4] {
        self.state.lock().vertices
    }

    /// Change the filter.
    ///
    /// The anisotropy stored is the one the driver grants. If a mipmap mode is
    /// requested and mipmaps cannot be created, the previous filter is kept
    /// and the error returned.
    pub fn set_filter(&self, filter: Filter) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        let previous = state.filter;

        state.filter = filter;
        if let Some(texture) = state.texture {
            state.filter.anisotropy = self.backend.set_texture_filter(texture, &filter);
        }

        if let Err(err) = self.check_mipmaps_created(&mut state) {
            state.filter = previous;
            if let Some(texture) = state.texture {
                self.backend.set_texture_filter(texture, &previous);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Change the wrap mode.
    pub fn set_wrap(&self, wrap: Wrap) {
        let mut state = self.state.lock();
        state.wrap = wrap;
        if let Some(texture) = state.texture {
            self.backend.set_texture_wrap(texture, &wrap);
        }
    }

    /// Current mipmap sharpness.
    pub fn mipmap_sharpness(&self) -> f32 {
        self.state.lock().mipmap_sharpness
    }

    /// Change the mipmap sharpness.
    ///
    /// The value is clamped inside the driver's LOD bias range, and forced to
    /// zero if the driver has no LOD bias.
    pub fn set_mipmap_sharpness(&self, sharpness: f32) {
        let mut state = self.state.lock();
        state.mipmap_sharpness = clamp_sharpness(&self.capabilities, sharpness);
        self.apply_sharpness(&state);
    }

    /// Corners of a sub-rectangle of the image.
    ///
    /// The rectangle is moved inside the image if it sticks out. Texture
    /// coordinates are fractions of the GPU texture, so they account for
    /// power-of-two padding.
    pub fn rectangle_vertices(&self, x: i32, y: i32, w: i32, h: i32) -> [TexturedVertex; 4] {
        let (width, height) = (self.width as i32, self.height as i32);
        let x = if x.saturating_add(w) > width {
            width.saturating_sub(w)
        } else {
            x
        };
        let y = if y.saturating_add(h) > height {
            height.saturating_sub(h)
        } else {
            y
        };
        let (x, y) = (x.max(0), y.max(0));

        let (padded_width, padded_height) = self.padded_size();
        let (pw, ph) = (padded_width as f32, padded_height as f32);
        let (w, h) = (w as f32, h as f32);
        let tx = x as f32 / pw;
        let ty = y as f32 / ph;
        let tw = w / pw;
        let th = h / ph;

        [
            TexturedVertex::new(0.0, 0.0, tx, ty),
            TexturedVertex::new(0.0, h, tx, ty + th),
            TexturedVertex::new(w, h, tx + tw, ty + th),
            TexturedVertex::new(w, 0.0, tx + tw, ty),
        ]
    }

    /// Upload to the GPU. Does nothing if already loaded.
    pub fn load(&self) -> Result<(), GraphicsError> {
        self.load_volatile()
    }

    /// Release the GPU texture, keeping the source and sampler state.
    pub fn unload(&self) {
        self.unload_volatile();
    }

    fn apply_sharpness(&self, state: &ImageState) {
        if !self.capabilities.has_mipmap_sharpness_support() {
            return;
        }
        if let Some(texture) = state.texture {
            // Negative bias is sharper.
            self.backend
                .set_texture_lod_bias(texture, -state.mipmap_sharpness);
        }
    }

    fn load_locked(&self, state: &mut ImageState) -> Result<TextureHandle, GraphicsError> {
        let unsupported = self
            .compressed_data()
            .map(|data| data.format())
            .filter(|&format| !self.capabilities.has_compressed_format_support(format));
        if let Some(format) = unsupported {
            return Err(GraphicsError::Unsupported(format!(
                "cannot create image: {format} compressed images are not supported on this system"
            )));
        }

        if let Some(texture) = state.texture {
            return Ok(texture);
        }

        let (padded_width, padded_height) = self.padded_size();
        let padded = (padded_width, padded_height) != (self.width, self.height);
        if padded && self.is_compressed() {
            return Err(GraphicsError::Unsupported(
                "cannot create image: NPOT compressed images are not supported on this system"
                    .to_string(),
            ));
        }

        let texture = self.backend.create_texture(None)?;
        state.filter.anisotropy = self.backend.set_texture_filter(texture, &state.filter);
        self.backend.set_texture_wrap(texture, &state.wrap);
        while self.backend.take_error().is_some() {}

        match &self.source {
            ImageSource::Compressed(data) => {
                let base = &data.levels()[0];
                self.backend.upload_compressed_level(
                    texture,
                    data.format(),
                    TextureRegion::new(0, base.width, base.height),
                    &base.data,
                );
            }
            ImageSource::Raw(data) if padded => {
                self.backend
                    .allocate_texture(texture, 0, padded_width, padded_height, None);
                self.backend.write_texture_region(
                    texture,
                    TextureRegion::new(0, self.width, self.height),
                    data.pixels(),
                );
            }
            ImageSource::Raw(data) => {
                self.backend.allocate_texture(
                    texture,
                    0,
                    self.width,
                    self.height,
                    Some(data.pixels()),
                );
            }
        }

        if let Some(err) = self.backend.take_error() {
            self.backend.destroy_texture(texture);
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "cannot create image: size may be too large for this system ({err})"
            )));
        }

        state.texture = Some(texture);
        state.vertices = corner_vertices(self.width, self.height, padded_width, padded_height);
        state.mipmaps_created = false;

        if let Err(err) = self.check_mipmaps_created(state) {
            state.texture = None;
            self.backend.destroy_texture(texture);
            return Err(err);
        }

        self.apply_sharpness(state);

        log::debug!(
            "Image {}x{}: loaded (texture {}, padded to {}x{})",
            self.width,
            self.height,
            texture.id(),
            padded_width,
            padded_height
        );
        Ok(texture)
    }

    fn check_mipmaps_created(&self, state: &mut ImageState) -> Result<(), GraphicsError> {
        if state.mipmaps_created || !state.filter.mipmap.uses_mipmaps() {
            return Ok(());
        }

        let pot = self.width.is_power_of_two() && self.height.is_power_of_two();
        match &self.source {
            ImageSource::Raw(_) => {
                if !self.capabilities.has_mipmap_support() {
                    return Err(GraphicsError::Unsupported(
                        "mipmap filtering is not supported on this system".to_string(),
                    ));
                }
                // Raw mipmap chains need power-of-two bases, even with NPOT support.
                if !pot {
                    return Err(GraphicsError::Unsupported(
                        "cannot create mipmaps: image does not have power of two dimensions"
                            .to_string(),
                    ));
                }
            }
            ImageSource::Compressed(_) => {
                if !pot && !self.capabilities.has_mipmap_support() {
                    return Err(GraphicsError::Unsupported(
                        "cannot create mipmaps: NPOT compressed image on a system without mipmap support"
                            .to_string(),
                    ));
                }
            }
        }

        let Some(texture) = state.texture else {
            return Ok(());
        };

        match &self.source {
            ImageSource::Compressed(data) => {
                let count = data.mipmap_count();
                if self.capabilities.texture_max_level {
                    let max_level = count.saturating_sub(1) as u32;
                    self.backend.set_texture_max_level(texture, Some(max_level));
                } else if data
                    .levels()
                    .last()
                    .is_some_and(|level| level.width > 1 || level.height > 1)
                {
                    return Err(GraphicsError::Unsupported(
                        "cannot load mipmaps: compressed image does not have all required levels"
                            .to_string(),
                    ));
                }

                log::debug!("Image: uploading {} compressed mipmap levels", count - 1);
                for (index, level) in data.levels().iter().enumerate().skip(1) {
                    self.backend.upload_compressed_level(
                        texture,
                        data.format(),
                        TextureRegion::new(index as u32, level.width, level.height),
                        &level.data,
                    );
                }
            }
            ImageSource::Raw(data) => {
                if self.capabilities.has_npot() && self.capabilities.framebuffer_mipmap_generation
                {
                    log::debug!("Image: generating mipmaps explicitly");
                    // The base level is re-uploaded in full before generating.
                    self.backend.allocate_texture(
                        texture,
                        0,
                        self.width,
                        self.height,
                        Some(data.pixels()),
                    );
                    self.backend.generate_mipmaps(texture);
                } else {
                    log::debug!("Image: generating mipmaps automatically");
                    self.backend.set_texture_auto_mipmaps(texture, true);
                    self.backend.write_texture_region(
                        texture,
                        TextureRegion::new(0, self.width, self.height),
                        data.pixels(),
                    );
                }
            }
        }

        if let Some(err) = self.backend.take_error() {
            self.discard_mipmap_setup(texture);
            return Err(GraphicsError::Backend(err));
        }

        state.mipmaps_created = true;
        Ok(())
    }

    /// Reset the driver state a failed mipmap setup may have changed.
    fn discard_mipmap_setup(&self, texture: TextureHandle) {
        if self.capabilities.texture_max_level {
            self.backend.set_texture_max_level(texture, None);
        }
        if self.capabilities.has_mipmap_support() {
            self.backend.set_texture_auto_mipmaps(texture, false);
        }
        if let Some(err) = self.backend.take_error() {
            log::warn!("Image: failed to reset mipmap state: {err}");
        }
    }

    fn bind_locked(&self) -> Result<(TextureHandle, MutexGuard<'_, ImageState>), GraphicsError> {
        let mut state = self.state.lock();
        let texture = self.load_locked(&mut state)?;
        Ok((texture, state))
    }

    fn draw_vertices(
        &self,
        texture: TextureHandle,
        vertices: [TexturedVertex; 4],
        transform: &Transform2d,
    ) -> Result<(), GraphicsError> {
        self.backend.submit_draw(DrawCommand::Quad(QuadDraw {
            transform: transform.to_matrix(),
            texture,
            vertices,
        }))?;
        Ok(())
    }
}

fn padded_size(capabilities: &Capabilities, width: u32, height: u32) -> (u32, u32) {
    if capabilities.has_npot() {
        (width, height)
    } else {
        (width.next_power_of_two(), height.next_power_of_two())
    }
}

fn clamp_sharpness(capabilities: &Capabilities, sharpness: f32) -> f32 {
    if !capabilities.has_mipmap_sharpness_support() {
        return 0.0;
    }
    let max = capabilities.max_lod_bias;
    sharpness
        .max(-max + SHARPNESS_EPSILON)
        .min(max - SHARPNESS_EPSILON)
}

fn corner_vertices(
    width: u32,
    height: u32,
    padded_width: u32,
    padded_height: u32,
) -> [TexturedVertex; 4] {
    let (w, h) = (width as f32, height as f32);
    let s = w / padded_width as f32;
    let t = h / padded_height as f32;
    [
        TexturedVertex::new(0.0, 0.0, 0.0, 0.0),
        TexturedVertex::new(0.0, h, 0.0, t),
        TexturedVertex::new(w, h, s, t),
        TexturedVertex::new(w, 0.0, s, 0.0),
    ]
}

impl Drawable for Image {
    fn draw(&self, transform: &Transform2d) -> Result<(), GraphicsError> {
        let (texture, state) = self.bind_locked()?;
        let vertices = state.vertices;
        drop(state);
        self.draw_vertices(texture, vertices, transform)
    }
}

impl Texture for Image {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn filter(&self) -> Filter {
        self.state.lock().filter
    }

    fn wrap(&self) -> Wrap {
        self.state.lock().wrap
    }

    fn bind(&self) -> Result<TextureHandle, GraphicsError> {
        self.bind_locked().map(|(texture, _)| texture)
    }

    fn drawq(&self, quad: &Quad, transform: &Transform2d) -> Result<(), GraphicsError> {
        let (texture, _) = self.bind_locked()?;
        self.draw_vertices(texture, *quad.vertices(), transform)
    }
}

impl Volatile for Image {
    fn load_volatile(&self) -> Result<(), GraphicsError> {
        self.load_locked(&mut self.state.lock()).map(|_| ())
    }

    fn unload_volatile(&self) {
        let mut state = self.state.lock();
        if let Some(texture) = state.texture.take() {
            self.backend.destroy_texture(texture);
            state.mipmaps_created = false;
            log::debug!("Image {}x{}: unloaded", self.width, self.height);
        }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if let Some(texture) = self.state.get_mut().texture.take() {
            self.backend.destroy_texture(texture);
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("compressed", &self.is_compressed())
            .finish()
    }
}

// Ensure Image is Send + Sync
static_assertions::assert_impl_all!(Image: Send, Sync);
