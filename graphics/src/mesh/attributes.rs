//! Named attributes read from vertex buffers.

use std::sync::Arc;

use sprig_core::mesh::{VertexAttribute, VertexMember, VertexStepMode};

use crate::error::GraphicsError;
use crate::resources::Buffer;

/// One attribute of a mesh's vertex format, read from a vertex buffer.
///
/// The attribute is exposed under `name`, which may differ from the name of
/// the member it reads in the source buffer.
#[derive(Debug, Clone)]
pub struct BufferAttribute {
    name: String,
    buffer: Arc<Buffer>,
    member: VertexMember,
    index_in_buffer: usize,
    step_mode: VertexStepMode,
    enabled: bool,
}

impl BufferAttribute {
    /// Read member `source_name` of `buffer` under the name `name`.
    ///
    /// # Errors
    ///
    /// Fails if `buffer` is not a vertex buffer or has no member called
    /// `source_name`.
    pub fn new(
        name: impl Into<String>,
        buffer: &Arc<Buffer>,
        source_name: &str,
        step_mode: VertexStepMode,
    ) -> Result<Self, GraphicsError> {
        let layout = buffer.layout().ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not a vertex buffer",
                buffer.label()
            ))
        })?;
        let (index_in_buffer, member) = layout.find(source_name).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "buffer {:?} has no vertex attribute named '{source_name}'",
                buffer.label()
            ))
        })?;

        Ok(Self {
            name: name.into(),
            buffer: Arc::clone(buffer),
            member: member.clone(),
            index_in_buffer,
            step_mode,
            enabled: true,
        })
    }

    /// Use every member of a vertex buffer under its own name and step mode.
    pub(crate) fn all_of(buffer: &Arc<Buffer>) -> Vec<Self> {
        buffer
            .layout()
            .map(|layout| {
                layout
                    .members()
                    .iter()
                    .enumerate()
                    .map(|(index_in_buffer, member)| Self {
                        name: member.name().to_owned(),
                        buffer: Arc::clone(buffer),
                        member: member.clone(),
                        index_in_buffer,
                        step_mode: member.attribute.step_mode,
                        enabled: true,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Name the attribute is exposed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// Member read from the source buffer.
    pub fn member(&self) -> &VertexMember {
        &self.member
    }

    /// Index of the member in the source buffer's layout.
    pub fn index_in_buffer(&self) -> usize {
        self.index_in_buffer
    }

    /// Step rate.
    pub fn step_mode(&self) -> VertexStepMode {
        self.step_mode
    }

    /// Check if the attribute takes part in draws.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Declaration as seen by the shader: exposed name, format and step rate.
    pub fn declaration(&self) -> VertexAttribute {
        VertexAttribute {
            name: self.name.clone(),
            format: self.member.attribute.format,
            step_mode: self.step_mode,
        }
    }

    /// Byte offset of this attribute in element `index` of the source buffer.
    pub(crate) fn offset_of(&self, index: usize) -> Result<usize, GraphicsError> {
        let count = self.buffer.element_count();
        if index >= count {
            return Err(GraphicsError::OutOfBounds(format!(
                "invalid vertex index {index} for attribute '{}' ({count} vertices)",
                self.name
            )));
        }
        Ok(index * self.buffer.stride() + self.member.offset)
    }
}
