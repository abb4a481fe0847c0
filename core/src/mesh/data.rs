//! CPU-side mesh data structures.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] - Index data format (u16 or u32)
//! - [`UsageHint`] - Expected update frequency of buffer contents
//! - [`MeshDescriptor`] - Descriptor for creating GPU meshes

use std::sync::Arc;

use super::layout::VertexLayout;

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Every vertex after the second forms a triangle with the first one.
    #[default]
    TriangleFan,
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers (max ~4 billion vertices).
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Smallest format able to address `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count > u16::MAX as usize + 1 {
            Self::Uint32
        } else {
            Self::Uint16
        }
    }

    /// Decode raw index bytes into `u32` values.
    ///
    /// Trailing bytes that do not form a whole index are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Vec<u32> {
        match self {
            Self::Uint16 => bytes
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]) as u32)
                .collect(),
            Self::Uint32 => bytes
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        }
    }

    /// Encode `u32` indices into raw bytes of this format.
    ///
    /// Values are truncated for [`IndexFormat::Uint16`]; callers pick the
    /// format with [`IndexFormat::for_vertex_count`].
    pub fn encode(&self, indices: &[u32]) -> Vec<u8> {
        match self {
            Self::Uint16 => {
                let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
                bytemuck::cast_slice::<u16, u8>(narrow.as_slice()).to_vec()
            }
            Self::Uint32 => bytemuck::cast_slice::<u32, u8>(indices).to_vec(),
        }
    }
}

/// Expected update frequency of buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    /// Written once, drawn many times.
    Static,
    /// Modified repeatedly, drawn many times.
    #[default]
    Dynamic,
    /// Modified once per draw.
    Stream,
}

/// Descriptor for creating a mesh.
///
/// Either a vertex count (zeroed storage) or initial vertex data must be set.
///
/// # Example
///
/// ```
/// use sprig_core::mesh::{MeshDescriptor, PrimitiveTopology, UsageHint, VertexLayout};
///
/// let desc = MeshDescriptor::new(VertexLayout::default_2d())
///     .with_vertex_count(4)
///     .with_topology(PrimitiveTopology::TriangleStrip)
///     .with_usage(UsageHint::Static)
///     .with_label("sprite");
///
/// assert_eq!(desc.vertex_buffer_size(), 80);
/// ```
#[derive(Debug, Clone)]
pub struct MeshDescriptor {
    /// Vertex layout (shared via Arc).
    pub layout: Arc<VertexLayout>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Initial vertex bytes, if any.
    pub vertex_data: Option<Vec<u8>>,
    /// Buffer usage hint.
    pub usage: UsageHint,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl MeshDescriptor {
    /// Create a new mesh descriptor with the given layout.
    pub fn new(layout: Arc<VertexLayout>) -> Self {
        Self {
            layout,
            topology: PrimitiveTopology::default(),
            vertex_count: 0,
            vertex_data: None,
            usage: UsageHint::default(),
            label: None,
        }
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the vertex count. Storage is zero-initialized.
    pub fn with_vertex_count(mut self, count: usize) -> Self {
        self.vertex_count = count;
        self.vertex_data = None;
        self
    }

    /// Set the initial vertex bytes.
    ///
    /// The vertex count is inferred from the data length and the stride.
    pub fn with_vertex_data(mut self, data: Vec<u8>) -> Self {
        let stride = self.layout.stride();
        if stride > 0 {
            self.vertex_count = data.len() / stride;
        }
        self.vertex_data = Some(data);
        self
    }

    /// Set the buffer usage hint.
    pub fn with_usage(mut self, usage: UsageHint) -> Self {
        self.usage = usage;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Compute the required vertex buffer size in bytes.
    pub fn vertex_buffer_size(&self) -> usize {
        self.vertex_count * self.layout.stride()
    }
}
