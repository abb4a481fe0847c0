//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't touch GPU hardware. It keeps buffer contents and
//! texture state in memory, records every draw, and reports the same errors
//! a driver with the configured [`Capabilities`] would.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use parking_lot::Mutex;
use sprig_core::sampler::{Filter, Wrap};
use sprig_core::texture::{CompressedFormat, ImageData};

use crate::capabilities::Capabilities;
use crate::types::BufferDescriptor;

use super::{
    BackendError, BufferHandle, DrawCommand, GpuBackend, TextureHandle, TextureRegion,
};

/// Storage of one allocated texture level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Compression format, or `None` for RGBA8.
    pub compressed: Option<CompressedFormat>,
}

/// Snapshot of a texture's state inside the dummy backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Allocated levels.
    pub levels: BTreeMap<u32, LevelInfo>,
    /// Current filter, with the granted anisotropy.
    pub filter: Filter,
    /// Current wrap.
    pub wrap: Wrap,
    /// Current LOD bias.
    pub lod_bias: f32,
    /// Highest mipmap level, if set.
    pub max_level: Option<u32>,
    /// Automatic mipmap generation flag.
    pub auto_mipmaps: bool,
    /// A full mipmap chain has been generated.
    pub mipmaps_generated: bool,
    /// Every region upload, in order.
    pub uploads: Vec<TextureRegion>,
}

impl TextureInfo {
    fn new(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_owned),
            levels: BTreeMap::new(),
            filter: Filter::default(),
            wrap: Wrap::default(),
            lod_bias: 0.0,
            max_level: None,
            auto_mipmaps: false,
            mipmaps_generated: false,
            uploads: Vec::new(),
        }
    }

    /// Size of level 0, if allocated.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.levels.get(&0).map(|l| (l.width, l.height))
    }
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u32,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, TextureInfo>,
    draws: Vec<DrawCommand>,
    error: Option<BackendError>,
}

impl DummyState {
    fn next_id(&mut self) -> NonZeroU32 {
        let id = NonZeroU32::MIN.saturating_add(self.next_id);
        self.next_id += 1;
        id
    }

    fn record(&mut self, error: BackendError) {
        log::trace!("DummyBackend: recording error {error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn texture(&mut self, texture: TextureHandle) -> Option<&mut TextureInfo> {
        if !self.textures.contains_key(&texture) {
            self.record(BackendError::InvalidHandle);
        }
        self.textures.get_mut(&texture)
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    capabilities: Capabilities,
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a dummy backend emulating a driver with the given capabilities.
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            state: Mutex::new(DummyState::default()),
        }
    }

    /// Get the emulated capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Snapshot of a live texture.
    pub fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        self.state.lock().textures.get(&texture).cloned()
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// All draws submitted so far.
    pub fn draw_calls(&self) -> Vec<DrawCommand> {
        self.state.lock().draws.clone()
    }

    /// Forget recorded draws.
    pub fn clear_draw_calls(&self) {
        self.state.lock().draws.clear();
    }

    /// Record `error` as if the driver had raised it.
    pub fn inject_error(&self, error: BackendError) {
        self.state.lock().record(error);
    }

    /// Number of live buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of live textures.
    pub fn live_texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidValue(
                "texture dimensions cannot be zero".to_string(),
            ));
        }
        let max = self.capabilities.max_texture_size;
        if width > max || height > max {
            return Err(BackendError::InvalidValue(format!(
                "texture size {width}x{height} exceeds maximum {max}"
            )));
        }
        if !self.capabilities.npot && (!width.is_power_of_two() || !height.is_power_of_two()) {
            return Err(BackendError::InvalidValue(format!(
                "texture size {width}x{height} is not a power of two"
            )));
        }
        Ok(())
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &str {
        "Dummy Backend"
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<BufferHandle, BackendError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );

        let size = descriptor.size as usize;
        let contents = match data {
            Some(data) if data.len() != size => {
                return Err(BackendError::InvalidValue(format!(
                    "initial data is {} bytes, buffer is {size}",
                    data.len()
                )));
            }
            Some(data) => data.to_vec(),
            None => vec![0; size],
        };

        let mut state = self.state.lock();
        let handle = BufferHandle::new(state.next_id());
        state.buffers.insert(handle, contents);
        Ok(handle)
    }

    fn write_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let contents = state
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::InvalidHandle)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            return Err(BackendError::InvalidValue(format!(
                "write of {} bytes at {start} overflows buffer of {}",
                data.len(),
                contents.len()
            )));
        }
        contents[start..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        log::trace!("DummyBackend: destroying buffer {}", buffer.id());
        self.state.lock().buffers.remove(&buffer);
    }

    fn create_texture(&self, label: Option<&str>) -> Result<TextureHandle, BackendError> {
        log::trace!("DummyBackend: creating texture {label:?}");
        let mut state = self.state.lock();
        let handle = TextureHandle::new(state.next_id());
        state.textures.insert(handle, TextureInfo::new(label));
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        log::trace!("DummyBackend: destroying texture {}", texture.id());
        self.state.lock().textures.remove(&texture);
    }

    fn set_texture_filter(&self, texture: TextureHandle, filter: &Filter) -> f32 {
        let granted = if self.capabilities.anisotropic_filtering {
            filter.anisotropy.clamp(1.0, self.capabilities.max_anisotropy)
        } else {
            1.0
        };
        let mut state = self.state.lock();
        if let Some(info) = state.texture(texture) {
            info.filter = filter.with_anisotropy(granted);
        }
        granted
    }

    fn set_texture_wrap(&self, texture: TextureHandle, wrap: &Wrap) {
        let mut state = self.state.lock();
        if let Some(info) = state.texture(texture) {
            info.wrap = *wrap;
        }
    }

    fn set_texture_lod_bias(&self, texture: TextureHandle, bias: f32) {
        let max = self.capabilities.max_lod_bias;
        let mut state = self.state.lock();
        if !self.capabilities.lod_bias || (bias != 0.0 && bias.abs() >= max) {
            state.record(BackendError::InvalidValue(format!(
                "LOD bias {bias} out of range"
            )));
            return;
        }
        if let Some(info) = state.texture(texture) {
            info.lod_bias = bias;
        }
    }

    fn set_texture_max_level(&self, texture: TextureHandle, level: Option<u32>) {
        let mut state = self.state.lock();
        if !self.capabilities.texture_max_level {
            state.record(BackendError::InvalidEnum(
                "max texture level is not supported".to_string(),
            ));
            return;
        }
        if let Some(info) = state.texture(texture) {
            info.max_level = level;
        }
    }

    fn set_texture_auto_mipmaps(&self, texture: TextureHandle, enabled: bool) {
        let mut state = self.state.lock();
        if enabled && !self.capabilities.mipmap_generation {
            state.record(BackendError::InvalidEnum(
                "automatic mipmap generation is not supported".to_string(),
            ));
            return;
        }
        if let Some(info) = state.texture(texture) {
            info.auto_mipmaps = enabled;
        }
    }

    fn allocate_texture(
        &self,
        texture: TextureHandle,
        level: u32,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) {
        log::trace!(
            "DummyBackend: allocating texture {} level {level} ({width}x{height})",
            texture.id()
        );
        let mut state = self.state.lock();
        if let Err(err) = self.check_size(width, height) {
            state.record(err);
            return;
        }
        let expected = width as usize * height as usize * ImageData::BYTES_PER_PIXEL;
        if let Some(len) = data.map(<[u8]>::len).filter(|&len| len != expected) {
            state.record(BackendError::InvalidValue(format!(
                "expected {expected} bytes of texel data, got {len}"
            )));
            return;
        }
        if let Some(info) = state.texture(texture) {
            info.levels.insert(
                level,
                LevelInfo {
                    width,
                    height,
                    compressed: None,
                },
            );
            if data.is_some() {
                info.uploads.push(TextureRegion::new(level, width, height));
                if level == 0 && info.auto_mipmaps {
                    info.mipmaps_generated = true;
                }
            }
        }
    }

    fn write_texture_region(&self, texture: TextureHandle, region: TextureRegion, data: &[u8]) {
        let mut state = self.state.lock();
        let expected =
            region.width as usize * region.height as usize * ImageData::BYTES_PER_PIXEL;
        if data.len() != expected {
            state.record(BackendError::InvalidValue(format!(
                "expected {expected} bytes of texel data, got {}",
                data.len()
            )));
            return;
        }
        let Some(info) = state.texture(texture) else {
            return;
        };
        let fits = info.levels.get(&region.level).is_some_and(|level| {
            level.compressed.is_none()
                && region.x + region.width <= level.width
                && region.y + region.height <= level.height
        });
        if !fits {
            state.record(BackendError::InvalidValue(format!(
                "region {region:?} is outside the allocated level"
            )));
            return;
        }
        if let Some(info) = state.textures.get_mut(&texture) {
            info.uploads.push(region);
            if region.level == 0 && info.auto_mipmaps {
                info.mipmaps_generated = true;
            }
        }
    }

    fn upload_compressed_level(
        &self,
        texture: TextureHandle,
        format: CompressedFormat,
        region: TextureRegion,
        data: &[u8],
    ) {
        log::trace!(
            "DummyBackend: uploading {format} level {} ({}x{})",
            region.level,
            region.width,
            region.height
        );
        let mut state = self.state.lock();
        if !self.capabilities.has_compressed_format_support(format) {
            state.record(BackendError::InvalidEnum(format!(
                "{format} compressed textures are not supported"
            )));
            return;
        }
        if let Err(err) = self.check_size(region.width, region.height) {
            state.record(err);
            return;
        }
        let expected = format.level_size(region.width, region.height);
        if data.len() != expected {
            state.record(BackendError::InvalidValue(format!(
                "expected {expected} bytes of {format} data, got {}",
                data.len()
            )));
            return;
        }
        if let Some(info) = state.texture(texture) {
            info.levels.insert(
                region.level,
                LevelInfo {
                    width: region.width,
                    height: region.height,
                    compressed: Some(format),
                },
            );
            info.uploads.push(region);
        }
    }

    fn generate_mipmaps(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        if !self.capabilities.framebuffer_mipmap_generation {
            state.record(BackendError::InvalidOperation(
                "explicit mipmap generation is not supported".to_string(),
            ));
            return;
        }
        let Some(info) = state.texture(texture) else {
            return;
        };
        if info.levels.contains_key(&0) {
            info.mipmaps_generated = true;
        } else {
            state.record(BackendError::InvalidOperation(
                "cannot generate mipmaps for an unallocated texture".to_string(),
            ));
        }
    }

    fn take_error(&self) -> Option<BackendError> {
        self.state.lock().error.take()
    }

    fn submit_draw(&self, command: DrawCommand) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if command
            .texture()
            .is_some_and(|texture| !state.textures.contains_key(&texture))
        {
            return Err(BackendError::InvalidHandle);
        }
        if let DrawCommand::Mesh(draw) = &command {
            let buffers_live = draw
                .attributes
                .iter()
                .map(|a| a.buffer)
                .chain(draw.indices.map(|i| i.buffer))
                .all(|b| state.buffers.contains_key(&b));
            if !buffers_live {
                return Err(BackendError::InvalidHandle);
            }
        }
        log::trace!("DummyBackend: draw {} submitted", state.draws.len());
        state.draws.push(command);
        Ok(())
    }
}
