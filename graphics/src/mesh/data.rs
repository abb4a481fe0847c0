//! Mesh definition with vertex/index buffers.
//!
//! A [`Mesh`] draws a set of named attributes. Attributes come from the
//! mesh's own vertex buffer and from attributes attached from other vertex
//! buffers, so geometry can be split across buffers with different update
//! rates, or extended with per-instance data.
//!
//! # Active format
//!
//! The attributes used by a draw are the enabled ones, own attributes first
//! in declaration order, then attachments in attach order. When two enabled
//! entries share a name, the most recently attached one is used in the place
//! of the earlier one. Shadowed entries stay attached and queryable.

use std::sync::Arc;

use sprig_core::math::Transform2d;
use sprig_core::mesh::{
    ATTRIBUTE_POSITION, IndexFormat, MeshDescriptor, PrimitiveTopology, UsageHint,
    VertexAttribute, VertexStepMode,
};

use crate::backend::{AttributeBinding, BufferHandle, DrawCommand, IndexBinding, MeshDraw};
use crate::device::GraphicsDevice;
use crate::drawable::{Drawable, Texture, Volatile};
use crate::error::GraphicsError;
use crate::resources::{Buffer, BufferMapping};

use super::attributes::BufferAttribute;

/// A drawable set of vertex attributes with an optional vertex map.
///
/// # Example
///
/// ```ignore
/// let layout = Arc::new(VertexLayout::new(vec![
///     VertexAttribute::position_3d(),
///     VertexAttribute::texcoord(),
/// ])?);
/// let mut mesh = device.create_mesh(
///     &MeshDescriptor::new(layout)
///         .with_vertex_count(4)
///         .with_topology(PrimitiveTopology::TriangleStrip),
/// )?;
/// mesh.set_vertex(0, bytemuck::cast_slice(&[0.0f32; 5]))?;
/// mesh.draw(&Transform2d::default())?;
/// ```
pub struct Mesh {
    device: Arc<GraphicsDevice>,
    vertex_buffer: Option<Arc<Buffer>>,
    vertex_count: usize,
    own: Vec<BufferAttribute>,
    attached: Vec<BufferAttribute>,
    index_buffer: Option<Arc<Buffer>>,
    topology: PrimitiveTopology,
    draw_range: Option<(usize, usize)>,
    texture: Option<Arc<dyn Texture>>,
    scratch: Vec<u8>,
    label: Option<String>,
}

impl Mesh {
    /// Create a mesh with its own vertex buffer (called by GraphicsDevice).
    pub(crate) fn new(
        device: &Arc<GraphicsDevice>,
        descriptor: &MeshDescriptor,
    ) -> Result<Self, GraphicsError> {
        let buffer = match &descriptor.vertex_data {
            Some(data) => device.create_vertex_buffer_with_data(
                Arc::clone(&descriptor.layout),
                data.clone(),
                descriptor.usage,
            )?,
            None => device.create_vertex_buffer(
                Arc::clone(&descriptor.layout),
                descriptor.vertex_count,
                descriptor.usage,
            )?,
        };

        Ok(Self {
            device: Arc::clone(device),
            vertex_count: buffer.element_count(),
            own: BufferAttribute::all_of(&buffer),
            vertex_buffer: Some(buffer),
            attached: Vec::new(),
            index_buffer: None,
            topology: descriptor.topology,
            draw_range: None,
            texture: None,
            scratch: Vec::new(),
            label: descriptor.label.clone(),
        })
    }

    /// Create a mesh composed only of attributes of external buffers
    /// (called by GraphicsDevice).
    ///
    /// The vertex count is the smallest element count among per-vertex
    /// attributes. Exactly one attribute must be the position.
    pub(crate) fn from_attributes(
        device: &Arc<GraphicsDevice>,
        attributes: Vec<BufferAttribute>,
        topology: PrimitiveTopology,
    ) -> Result<Self, GraphicsError> {
        let positions = attributes
            .iter()
            .filter(|a| a.name() == ATTRIBUTE_POSITION)
            .count();
        if positions != 1 {
            return Err(GraphicsError::InvalidParameter(format!(
                "a mesh needs exactly one '{ATTRIBUTE_POSITION}' attribute, got {positions}"
            )));
        }

        let vertex_count = attributes
            .iter()
            .filter(|a| a.step_mode() == VertexStepMode::Vertex)
            .map(|a| a.buffer().element_count())
            .min()
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(
                    "a mesh needs at least one per-vertex attribute".to_string(),
                )
            })?;

        Ok(Self {
            device: Arc::clone(device),
            vertex_buffer: None,
            vertex_count,
            own: Vec::new(),
            attached: attributes,
            index_buffer: None,
            topology,
            draw_range: None,
            texture: None,
            scratch: Vec::new(),
            label: None,
        })
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the mesh label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Stride of the mesh's own vertex buffer.
    pub fn vertex_stride(&self) -> Option<usize> {
        self.vertex_buffer.as_ref().map(|b| b.stride())
    }

    /// The mesh's own vertex buffer, if it has one.
    pub fn vertex_buffer(&self) -> Option<&Arc<Buffer>> {
        self.vertex_buffer.as_ref()
    }

    /// Attributes attached from other buffers, in attach order.
    pub fn attached_attributes(&self) -> &[BufferAttribute] {
        &self.attached
    }

    /// Get the primitive topology.
    pub fn draw_mode(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Set the primitive topology.
    pub fn set_draw_mode(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    /// Texture bound when drawing.
    pub fn texture(&self) -> Option<&Arc<dyn Texture>> {
        self.texture.as_ref()
    }

    /// Set or clear the texture bound when drawing.
    pub fn set_texture(&mut self, texture: Option<Arc<dyn Texture>>) {
        self.texture = texture;
    }

    fn own_buffer(&self) -> Result<&Arc<Buffer>, GraphicsError> {
        self.vertex_buffer.as_ref().ok_or_else(|| {
            GraphicsError::InvalidOperation("mesh has no vertex buffer of its own".to_string())
        })
    }

    fn scratch(&mut self, size: usize) -> &mut [u8] {
        if self.scratch.len() < size {
            self.scratch.resize(size, 0);
        }
        &mut self.scratch[..size]
    }

    /// Write the bytes of one vertex of the own vertex buffer.
    ///
    /// `data` may be shorter than the stride, in which case only the leading
    /// bytes are written.
    pub fn set_vertex(&mut self, index: usize, data: &[u8]) -> Result<(), GraphicsError> {
        let buffer = self.own_buffer()?;
        let stride = buffer.stride();
        if index >= self.vertex_count {
            return Err(GraphicsError::OutOfBounds(format!(
                "invalid vertex index {index} ({} vertices)",
                self.vertex_count
            )));
        }
        if data.len() > stride {
            return Err(GraphicsError::InvalidParameter(format!(
                "{} bytes of vertex data exceed the vertex stride {stride}",
                data.len()
            )));
        }
        buffer.write(index * stride, data)
    }

    /// Read the bytes of one vertex of the own vertex buffer.
    pub fn get_vertex(&mut self, index: usize) -> Result<&[u8], GraphicsError> {
        let buffer = Arc::clone(self.own_buffer()?);
        if index >= self.vertex_count {
            return Err(GraphicsError::OutOfBounds(format!(
                "invalid vertex index {index} ({} vertices)",
                self.vertex_count
            )));
        }
        let stride = buffer.stride();
        let scratch = self.scratch(stride);
        buffer.read(index * stride, scratch)?;
        Ok(scratch)
    }

    /// Resolve the enabled attribute used for `name`.
    fn find_enabled(&self, name: &str) -> Result<&BufferAttribute, GraphicsError> {
        let mut entries = self
            .attached
            .iter()
            .rev()
            .chain(self.own.iter().rev())
            .filter(|a| a.name() == name)
            .peekable();
        if entries.peek().is_none() {
            return Err(GraphicsError::InvalidParameter(format!(
                "mesh has no vertex attribute named '{name}'"
            )));
        }
        entries.find(|a| a.is_enabled()).ok_or_else(|| {
            GraphicsError::InvalidOperation(format!("vertex attribute '{name}' is disabled"))
        })
    }

    /// Write one named attribute of one vertex.
    ///
    /// `data` may be shorter than the attribute, in which case only the
    /// leading bytes are written.
    pub fn set_vertex_attribute(
        &mut self,
        index: usize,
        name: &str,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let attribute = self.find_enabled(name)?;
        let size = attribute.member().size();
        if data.len() > size {
            return Err(GraphicsError::InvalidParameter(format!(
                "{} bytes of data exceed the size {size} of attribute '{name}'",
                data.len()
            )));
        }
        let offset = attribute.offset_of(index)?;
        attribute.buffer().write(offset, data)
    }

    /// Read one named attribute of one vertex.
    pub fn get_vertex_attribute(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<&[u8], GraphicsError> {
        let attribute = self.find_enabled(name)?;
        let size = attribute.member().size();
        let offset = attribute.offset_of(index)?;
        let buffer = Arc::clone(attribute.buffer());
        let scratch = self.scratch(size);
        buffer.read(offset, scratch)?;
        Ok(scratch)
    }

    /// Enable or disable the most recent attribute called `name`.
    pub fn set_attribute_enabled(&mut self, name: &str, enabled: bool) -> Result<(), GraphicsError> {
        let attribute = self
            .attached
            .iter_mut()
            .rev()
            .chain(self.own.iter_mut().rev())
            .find(|a| a.name() == name)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "mesh has no vertex attribute named '{name}'"
                ))
            })?;
        attribute.set_enabled(enabled);
        Ok(())
    }

    /// Check if the most recent attribute called `name` is enabled.
    pub fn is_attribute_enabled(&self, name: &str) -> Result<bool, GraphicsError> {
        self.attached
            .iter()
            .rev()
            .chain(self.own.iter().rev())
            .find(|a| a.name() == name)
            .map(BufferAttribute::is_enabled)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "mesh has no vertex attribute named '{name}'"
                ))
            })
    }

    /// Attach member `source_name` of `buffer` under the name `name`.
    ///
    /// The position attribute cannot be attached if the mesh already has one.
    pub fn attach_attribute(
        &mut self,
        name: &str,
        buffer: &Arc<Buffer>,
        source_name: &str,
        step_mode: VertexStepMode,
    ) -> Result<(), GraphicsError> {
        if name == ATTRIBUTE_POSITION
            && self
                .own
                .iter()
                .chain(self.attached.iter())
                .any(|a| a.name() == ATTRIBUTE_POSITION)
        {
            return Err(GraphicsError::InvalidOperation(format!(
                "mesh already has a '{ATTRIBUTE_POSITION}' attribute"
            )));
        }

        let attribute = BufferAttribute::new(name, buffer, source_name, step_mode)?;
        log::trace!(
            "Mesh {:?}: attached '{source_name}' of buffer {:?} as '{name}'",
            self.label,
            buffer.label()
        );
        self.attached.push(attribute);
        Ok(())
    }

    /// Detach the most recently attached attribute called `name`.
    pub fn detach_attribute(&mut self, name: &str) -> Result<(), GraphicsError> {
        let position = self
            .attached
            .iter()
            .rposition(|a| a.name() == name)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "mesh has no attached vertex attribute named '{name}'"
                ))
            })?;
        self.attached.remove(position);
        Ok(())
    }

    fn active_attributes(&self) -> Vec<&BufferAttribute> {
        let mut active: Vec<&BufferAttribute> = Vec::new();
        for attribute in self.own.iter().chain(self.attached.iter()) {
            if !attribute.is_enabled() {
                continue;
            }
            match active.iter_mut().find(|a| a.name() == attribute.name()) {
                Some(slot) => *slot = attribute,
                None => active.push(attribute),
            }
        }
        active
    }

    /// Declarations of the attributes a draw would use, in order.
    pub fn vertex_format(&self) -> Vec<VertexAttribute> {
        self.active_attributes()
            .into_iter()
            .map(BufferAttribute::declaration)
            .collect()
    }

    /// Open a mapping of the own vertex buffer.
    pub fn map_vertices(&self) -> Result<BufferMapping<'_>, GraphicsError> {
        self.own_buffer()?.map()
    }

    /// Upload pending vertex and index writes.
    pub fn flush(&self) -> Result<(), GraphicsError> {
        if let Some(buffer) = &self.vertex_buffer {
            buffer.flush()?;
        }
        for attribute in &self.attached {
            attribute.buffer().flush()?;
        }
        if let Some(buffer) = &self.index_buffer {
            buffer.flush()?;
        }
        Ok(())
    }

    /// Draw vertices in the order given by `indices`.
    ///
    /// The index width is the smallest one able to address every vertex.
    pub fn set_vertex_map(&mut self, indices: &[u32]) -> Result<(), GraphicsError> {
        let format = IndexFormat::for_vertex_count(self.vertex_count);
        self.replace_vertex_map(format, indices)
    }

    /// Draw vertices in the order given by raw index bytes of `format`.
    pub fn set_vertex_map_bytes(
        &mut self,
        format: IndexFormat,
        bytes: &[u8],
    ) -> Result<(), GraphicsError> {
        if bytes.len() % format.size() != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "{} bytes is not a whole number of {format:?} indices",
                bytes.len()
            )));
        }
        let indices = format.decode(bytes);
        self.replace_vertex_map(format, &indices)
    }

    fn replace_vertex_map(
        &mut self,
        format: IndexFormat,
        indices: &[u32],
    ) -> Result<(), GraphicsError> {
        if indices.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "vertex map cannot be empty".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= self.vertex_count) {
            return Err(GraphicsError::OutOfBounds(format!(
                "invalid vertex map value {bad} ({} vertices)",
                self.vertex_count
            )));
        }

        if let Some(buffer) = self.reusable_index_buffer(format, indices.len()) {
            buffer.write(0, &format.encode(indices))?;
            return Ok(());
        }

        let hint = self
            .vertex_buffer
            .as_ref()
            .map_or(UsageHint::Dynamic, |b| b.hint());
        let buffer =
            self.device
                .create_index_buffer_from_bytes(format, format.encode(indices), hint)?;
        self.index_buffer = Some(buffer);
        Ok(())
    }

    /// The current index buffer, when only this mesh holds it and it has
    /// room for exactly `count` indices of `format`.
    fn reusable_index_buffer(&self, format: IndexFormat, count: usize) -> Option<&Arc<Buffer>> {
        self.index_buffer.as_ref().filter(|buffer| {
            Arc::strong_count(buffer) == 1
                && buffer.index_format() == Some(format)
                && buffer.element_count() == count
        })
    }

    /// Draw vertices in storage order again.
    pub fn clear_vertex_map(&mut self) {
        self.index_buffer = None;
    }

    /// Order in which vertices are drawn.
    ///
    /// Without a vertex map this is `0..vertex_count`.
    pub fn vertex_map(&self) -> Result<Vec<u32>, GraphicsError> {
        match &self.index_buffer {
            Some(buffer) => buffer.indices(),
            None => Ok((0..self.vertex_count as u32).collect()),
        }
    }

    /// Draw through an externally managed index buffer, replacing any vertex map.
    pub fn set_index_buffer(&mut self, buffer: Option<Arc<Buffer>>) -> Result<(), GraphicsError> {
        if let Some(buffer) = &buffer {
            if buffer.index_format().is_none() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "buffer {:?} is not an index buffer",
                    buffer.label()
                )));
            }
        }
        self.index_buffer = buffer;
        Ok(())
    }

    /// The index buffer in use, from a vertex map or set directly.
    pub fn index_buffer(&self) -> Option<&Arc<Buffer>> {
        self.index_buffer.as_ref()
    }

    /// Number of indices drawn through the vertex map, or 0 without one.
    pub fn index_count(&self) -> usize {
        self.index_buffer.as_ref().map_or(0, |b| b.element_count())
    }

    /// Restrict draws to `count` vertices (or indices) starting at `start`.
    ///
    /// The range is intersected with the available vertices at draw time.
    pub fn set_draw_range(&mut self, start: usize, count: usize) -> Result<(), GraphicsError> {
        if count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "draw range count must be greater than zero".to_string(),
            ));
        }
        if start.checked_add(count).is_none() {
            return Err(GraphicsError::InvalidParameter(format!(
                "draw range {start}+{count} overflows"
            )));
        }
        self.draw_range = Some((start, count));
        Ok(())
    }

    /// Draw everything again.
    pub fn clear_draw_range(&mut self) {
        self.draw_range = None;
    }

    /// Explicit draw range, if set.
    pub fn draw_range(&self) -> Option<(usize, usize)> {
        self.draw_range
    }

    /// Draw `instance_count` instances.
    ///
    /// Per-instance attributes advance once per instance. Drawing zero
    /// instances, or an empty range, does nothing.
    pub fn draw_instanced(
        &self,
        transform: &Transform2d,
        instance_count: u32,
    ) -> Result<(), GraphicsError> {
        if instance_count > 1 && !self.device.capabilities().has_instancing_support() {
            return Err(GraphicsError::Unsupported(
                "instancing is not supported on this system".to_string(),
            ));
        }
        if instance_count == 0 {
            return Ok(());
        }

        let active = self.active_attributes();
        if !active.iter().any(|a| a.name() == ATTRIBUTE_POSITION) {
            return Err(GraphicsError::InvalidOperation(format!(
                "mesh must have an enabled '{ATTRIBUTE_POSITION}' attribute to be drawn"
            )));
        }

        let total = match &self.index_buffer {
            Some(buffer) => buffer.element_count(),
            None => self.vertex_count,
        };
        let (first, end) = match self.draw_range {
            Some((start, count)) => (start.min(total), (start + count).min(total)),
            None => (0, total),
        };
        if first >= end {
            return Ok(());
        }

        let mut attributes = Vec::with_capacity(active.len());
        for attribute in active {
            let (needed, unit) = match attribute.step_mode() {
                VertexStepMode::Vertex => (self.vertex_count, "vertices"),
                VertexStepMode::Instance => (instance_count as usize, "instances"),
            };
            let available = attribute.buffer().element_count();
            if available < needed {
                return Err(GraphicsError::InvalidOperation(format!(
                    "buffer of attribute '{}' holds {available} elements, {needed} {unit} are drawn",
                    attribute.name()
                )));
            }

            let member = attribute.member();
            attributes.push(AttributeBinding {
                name: attribute.name().to_owned(),
                buffer: prepare(attribute.buffer())?,
                offset: member.offset,
                stride: attribute.buffer().stride(),
                format: member.attribute.format,
                step_mode: attribute.step_mode(),
            });
        }

        let indices = match &self.index_buffer {
            Some(buffer) => Some(IndexBinding {
                buffer: prepare(buffer)?,
                format: buffer.index_format().unwrap_or_default(),
            }),
            None => None,
        };

        let texture = self.texture.as_ref().map(|t| t.bind()).transpose()?;

        self.device.backend().submit_draw(DrawCommand::Mesh(MeshDraw {
            transform: transform.to_matrix(),
            topology: self.topology,
            texture,
            attributes,
            indices,
            first: first as u32,
            count: (end - first) as u32,
            instance_count,
        }))?;
        Ok(())
    }
}

/// Make sure a buffer is on the GPU with its latest contents.
fn prepare(buffer: &Buffer) -> Result<BufferHandle, GraphicsError> {
    buffer.load_volatile()?;
    buffer.flush()?;
    buffer.handle().ok_or_else(|| {
        GraphicsError::InvalidOperation(format!("buffer {:?} is not loaded", buffer.label()))
    })
}

impl Drawable for Mesh {
    fn draw(&self, transform: &Transform2d) -> Result<(), GraphicsError> {
        self.draw_instanced(transform, 1)
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("attached_count", &self.attached.len())
            .field("index_count", &self.index_count())
            .field("draw_range", &self.draw_range)
            .finish()
    }
}

// Ensure Mesh is Send + Sync
static_assertions::assert_impl_all!(Mesh: Send, Sync);
