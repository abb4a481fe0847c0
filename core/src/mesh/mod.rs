//! CPU-side mesh types.
//!
//! This module provides GPU-agnostic mesh data structures:
//!
//! - [`VertexLayout`] - Named vertex attributes with offsets and stride
//! - [`MeshDescriptor`] - Descriptor for creating GPU meshes
//! - [`IndexFormat`], [`PrimitiveTopology`], [`UsageHint`]
//!
//! These types are re-exported by `sprig-graphics` for convenience.

mod data;
mod layout;

pub use data::{IndexFormat, MeshDescriptor, PrimitiveTopology, UsageHint};
pub use layout::{
    ATTRIBUTE_COLOR, ATTRIBUTE_POSITION, ATTRIBUTE_TEXCOORD, LayoutError, VertexAttribute,
    VertexAttributeFormat, VertexLayout, VertexMember, VertexStepMode,
};
