//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources.
//! It pairs a [`GpuBackend`] with the [`Capabilities`] it reports and the
//! [`GraphicsConfig`] new resources start from.

use std::sync::{Arc, RwLock, Weak};

use sprig_core::mesh::{IndexFormat, MeshDescriptor, PrimitiveTopology, UsageHint, VertexLayout};

use crate::backend::GpuBackend;
use crate::capabilities::Capabilities;
use crate::config::GraphicsConfig;
use crate::drawable::Volatile;
use crate::error::GraphicsError;
use crate::mesh::{BufferAttribute, Mesh};
use crate::resources::{Buffer, BufferFormat, Image, ImageSource};
use crate::types::{BufferDescriptor, BufferUsage};

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// All resource creation methods use interior mutability where needed.
///
/// # Example
///
/// ```ignore
/// let backend = Arc::new(DummyBackend::new(Capabilities::modern()));
/// let device = GraphicsDevice::new(backend, Capabilities::modern(), GraphicsConfig::default());
///
/// let image = device.create_image(ImageData::new(100, 50, pixels)?.into())?;
/// let mesh = device.create_mesh(&MeshDescriptor::new(VertexLayout::default_2d()).with_vertex_count(4))?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: Capabilities,
    config: GraphicsConfig,
    // Track allocated resources (weak references for cleanup/reload)
    buffers: RwLock<Vec<Weak<Buffer>>>,
    images: RwLock<Vec<Weak<Image>>>,
}

impl GraphicsDevice {
    /// Create a device on top of a backend.
    pub fn new(
        backend: Arc<dyn GpuBackend>,
        capabilities: Capabilities,
        config: GraphicsConfig,
    ) -> Arc<Self> {
        log::debug!(
            "GraphicsDevice: created on {} backend ({capabilities:?})",
            backend.name()
        );
        Arc::new(Self {
            backend,
            capabilities,
            config,
            buffers: RwLock::new(Vec::new()),
            images: RwLock::new(Vec::new()),
        })
    }

    /// Get the backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Get the defaults for new resources.
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    fn track_buffer(&self, buffer: Buffer) -> Arc<Buffer> {
        let buffer = Arc::new(buffer);
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.retain(|w| w.strong_count() > 0);
            buffers.push(Arc::downgrade(&buffer));
        }
        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            buffer.label(),
            buffer.size()
        );
        buffer
    }

    /// Create a zero-filled vertex buffer of `count` vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is zero or allocation fails.
    pub fn create_vertex_buffer(
        self: &Arc<Self>,
        layout: Arc<VertexLayout>,
        count: usize,
        hint: UsageHint,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "vertex count must be greater than zero".to_string(),
            ));
        }
        let size = layout.stride().checked_mul(count).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("{count} vertices overflow a buffer"))
        })?;
        self.create_vertex_buffer_with_data(layout, vec![0; size], hint)
    }

    /// Create a vertex buffer holding `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty, is not a whole number of
    /// vertices, or allocation fails.
    pub fn create_vertex_buffer_with_data(
        self: &Arc<Self>,
        layout: Arc<VertexLayout>,
        data: Vec<u8>,
        hint: UsageHint,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let mut descriptor =
            BufferDescriptor::new(data.len() as u64, BufferUsage::VERTEX).with_hint(hint);
        descriptor.label = layout.label.clone();
        let buffer = Buffer::new(self, descriptor, BufferFormat::Vertex(layout), data)?;
        Ok(self.track_buffer(buffer))
    }

    /// Create an index buffer, using the narrowest format that holds every index.
    pub fn create_index_buffer(
        self: &Arc<Self>,
        indices: &[u32],
        hint: UsageHint,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let format = match indices.iter().max() {
            Some(&max) if max > u16::MAX as u32 => IndexFormat::Uint32,
            _ => IndexFormat::Uint16,
        };
        self.create_index_buffer_from_bytes(format, format.encode(indices), hint)
    }

    /// Create an index buffer from raw index bytes.
    pub fn create_index_buffer_from_bytes(
        self: &Arc<Self>,
        format: IndexFormat,
        bytes: Vec<u8>,
        hint: UsageHint,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let descriptor =
            BufferDescriptor::new(bytes.len() as u64, BufferUsage::INDEX).with_hint(hint);
        let buffer = Buffer::new(self, descriptor, BufferFormat::Index(format), bytes)?;
        Ok(self.track_buffer(buffer))
    }

    /// Create a mesh with its own vertex buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor asks for zero vertices, or if its
    /// vertex data is not a whole number of vertices.
    pub fn create_mesh(self: &Arc<Self>, descriptor: &MeshDescriptor) -> Result<Mesh, GraphicsError> {
        if descriptor.vertex_data.is_none() && descriptor.vertex_count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "a mesh needs at least one vertex".to_string(),
            ));
        }
        let mesh = Mesh::new(self, descriptor)?;
        log::trace!(
            "GraphicsDevice: created mesh {:?}, {} vertices",
            descriptor.label,
            mesh.vertex_count()
        );
        Ok(mesh)
    }

    /// Create a mesh whose attributes all come from existing buffers.
    pub fn create_mesh_from_attributes(
        self: &Arc<Self>,
        attributes: Vec<BufferAttribute>,
        topology: PrimitiveTopology,
    ) -> Result<Mesh, GraphicsError> {
        Mesh::from_attributes(self, attributes, topology)
    }

    /// Create an image and upload it.
    ///
    /// # Errors
    ///
    /// Returns an error if the source format is unsupported or the upload fails.
    pub fn create_image(
        self: &Arc<Self>,
        source: ImageSource,
    ) -> Result<Arc<Image>, GraphicsError> {
        let image = Arc::new(Image::new(self, source));
        image.load()?;

        if let Ok(mut images) = self.images.write() {
            images.retain(|w| w.strong_count() > 0);
            images.push(Arc::downgrade(&image));
        }

        log::trace!(
            "GraphicsDevice: created image {}x{}",
            image.source().width(),
            image.source().height()
        );

        Ok(image)
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .map(|b| b.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live images created by this device.
    pub fn image_count(&self) -> usize {
        self.images
            .read()
            .map(|i| i.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.retain(|w| w.strong_count() > 0);
        }
        if let Ok(mut images) = self.images.write() {
            images.retain(|w| w.strong_count() > 0);
        }
    }

    fn live_buffers(&self) -> Vec<Arc<Buffer>> {
        self.buffers
            .read()
            .map(|b| b.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    fn live_images(&self) -> Vec<Arc<Image>> {
        self.images
            .read()
            .map(|i| i.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Release the GPU side of every live resource, e.g. before the context is lost.
    pub fn unload_all(&self) {
        let images = self.live_images();
        let buffers = self.live_buffers();
        log::debug!(
            "GraphicsDevice: unloading {} images, {} buffers",
            images.len(),
            buffers.len()
        );
        for image in images {
            image.unload_volatile();
        }
        for buffer in buffers {
            buffer.unload_volatile();
        }
    }

    /// Recreate the GPU side of every live resource.
    ///
    /// Every resource is attempted; the first failure is returned.
    pub fn reload_all(&self) -> Result<(), GraphicsError> {
        let mut first_error = None;
        for buffer in self.live_buffers() {
            if let Err(err) = buffer.load_volatile() {
                log::warn!("GraphicsDevice: failed to reload buffer {:?}: {err}", buffer.label());
                first_error.get_or_insert(err);
            }
        }
        for image in self.live_images() {
            if let Err(err) = image.load_volatile() {
                log::warn!("GraphicsDevice: failed to reload image: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .field("config", &self.config)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
