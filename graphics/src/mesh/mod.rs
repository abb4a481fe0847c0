//! Mesh types for the graphics engine.
//!
//! This module provides mesh data structures for rendering:
//!
//! - [`VertexLayout`] - Describes vertex attributes (shared via `Arc`)
//! - [`BufferAttribute`] - A named attribute read from a vertex buffer
//! - [`Mesh`] - Drawable set of attributes with an optional vertex map
//!
//! # Efficient Sharing via Arc
//!
//! Vertex layouts are wrapped in `Arc` since there are typically only a few
//! layout combinations across many buffers. Vertex buffers are shared the
//! same way, so one buffer can feed attributes of several meshes.

mod attributes;
mod data;

pub use attributes::BufferAttribute;
pub use data::Mesh;
pub use sprig_core::mesh::{
    ATTRIBUTE_COLOR, ATTRIBUTE_POSITION, ATTRIBUTE_TEXCOORD, IndexFormat, LayoutError,
    MeshDescriptor, PrimitiveTopology, UsageHint, VertexAttribute, VertexAttributeFormat,
    VertexLayout, VertexMember, VertexStepMode,
};
