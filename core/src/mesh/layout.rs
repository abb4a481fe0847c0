//! Vertex layout definitions for meshes.
//!
//! A vertex layout is an ordered list of named attribute declarations. Each
//! declaration carries a data format and a step mode; the layout computes the
//! byte offset of every attribute and the stride of one vertex.
//!
//! Layouts are shared via `Arc` since there are typically only a few
//! combinations across many meshes.
//!
//! # Example
//!
//! ```
//! use sprig_core::mesh::{VertexAttribute, VertexAttributeFormat, VertexLayout};
//!
//! let layout = VertexLayout::new(vec![
//!     VertexAttribute::new("VertexPosition", VertexAttributeFormat::Float3),
//!     VertexAttribute::new("VertexTexCoord", VertexAttributeFormat::Float2),
//! ])
//! .unwrap();
//!
//! assert_eq!(layout.stride(), 20);
//! assert_eq!(layout.member(1).unwrap().offset, 12);
//! ```

use std::fmt;
use std::sync::Arc;

/// Attribute name used for vertex positions.
pub const ATTRIBUTE_POSITION: &str = "VertexPosition";
/// Attribute name used for texture coordinates.
pub const ATTRIBUTE_TEXCOORD: &str = "VertexTexCoord";
/// Attribute name used for per-vertex colors.
pub const ATTRIBUTE_COLOR: &str = "VertexColor";

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Single 32-bit float.
    Float,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Single 32-bit signed integer.
    Int,
    /// Two 32-bit signed integers.
    Int2,
    /// Four 32-bit signed integers.
    Int4,
    /// Single 32-bit unsigned integer.
    Uint,
    /// Two 32-bit unsigned integers.
    Uint2,
    /// Four 32-bit unsigned integers.
    Uint4,
    /// Two 16-bit unsigned integers (normalized to 0.0-1.0).
    Unorm16x2,
    /// Four 16-bit unsigned integers (normalized to 0.0-1.0).
    Unorm16x4,
    /// Four 8-bit unsigned integers (normalized to 0.0-1.0).
    Unorm8x4,
    /// Four 8-bit signed integers (normalized to -1.0-1.0).
    Snorm8x4,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Uint => 4,
            Self::Float2 | Self::Int2 | Self::Uint2 => 8,
            Self::Float3 => 12,
            Self::Float4 | Self::Int4 | Self::Uint4 => 16,
            Self::Unorm16x2 => 4,
            Self::Unorm16x4 => 8,
            Self::Unorm8x4 | Self::Snorm8x4 => 4,
        }
    }
}

/// How an attribute advances: per-vertex or per-instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Advances once per vertex (default).
    #[default]
    Vertex,
    /// Advances once per instance (for instanced rendering).
    Instance,
}

/// A single vertex attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Name used to match the attribute with shader inputs.
    pub name: String,
    /// Data format of this attribute.
    pub format: VertexAttributeFormat,
    /// Step rate of this attribute.
    pub step_mode: VertexStepMode,
}

impl VertexAttribute {
    /// Create a new per-vertex attribute declaration.
    pub fn new(name: impl Into<String>, format: VertexAttributeFormat) -> Self {
        Self {
            name: name.into(),
            format,
            step_mode: VertexStepMode::Vertex,
        }
    }

    /// Create a 2D position attribute (float2).
    pub fn position_2d() -> Self {
        Self::new(ATTRIBUTE_POSITION, VertexAttributeFormat::Float2)
    }

    /// Create a 3D position attribute (float3).
    pub fn position_3d() -> Self {
        Self::new(ATTRIBUTE_POSITION, VertexAttributeFormat::Float3)
    }

    /// Create a texture coordinate attribute (float2).
    pub fn texcoord() -> Self {
        Self::new(ATTRIBUTE_TEXCOORD, VertexAttributeFormat::Float2)
    }

    /// Create a color attribute (unorm8x4).
    pub fn color() -> Self {
        Self::new(ATTRIBUTE_COLOR, VertexAttributeFormat::Unorm8x4)
    }

    /// Set the step mode to per-instance.
    pub fn per_instance(mut self) -> Self {
        self.step_mode = VertexStepMode::Instance;
        self
    }

    /// Size in bytes of one element of this attribute.
    pub fn size(&self) -> usize {
        self.format.size()
    }
}

/// An attribute declaration placed at a byte offset inside a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexMember {
    /// The declaration.
    pub attribute: VertexAttribute,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
}

impl VertexMember {
    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.attribute.name
    }

    /// Size in bytes of the attribute.
    pub fn size(&self) -> usize {
        self.attribute.size()
    }
}

/// Errors produced while building a [`VertexLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout declares no attributes.
    Empty,
    /// Two attributes share the same name.
    DuplicateName(String),
    /// The requested stride is smaller than the declared vertex size.
    StrideTooSmall {
        /// Requested stride in bytes.
        stride: usize,
        /// Sum of the declared attribute sizes.
        required: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "vertex layout must declare at least one attribute"),
            Self::DuplicateName(name) => {
                write!(f, "duplicate vertex attribute name '{name}'")
            }
            Self::StrideTooSmall { stride, required } => write!(
                f,
                "vertex stride {stride} is smaller than the declared vertex size {required}"
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Describes the byte layout of one vertex.
///
/// Attributes are tightly packed in declaration order unless a larger stride
/// is requested with [`VertexLayout::with_stride`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    members: Vec<VertexMember>,
    stride: usize,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl VertexLayout {
    /// Build a tightly packed layout from attribute declarations.
    pub fn new(attributes: Vec<VertexAttribute>) -> Result<Self, LayoutError> {
        if attributes.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut members: Vec<VertexMember> = Vec::with_capacity(attributes.len());
        let mut offset = 0;
        for attribute in attributes {
            if members.iter().any(|m| m.attribute.name == attribute.name) {
                return Err(LayoutError::DuplicateName(attribute.name));
            }
            let size = attribute.size();
            members.push(VertexMember { attribute, offset });
            offset += size;
        }

        Ok(Self {
            members,
            stride: offset,
            label: None,
        })
    }

    /// Use a stride larger than the packed vertex size.
    pub fn with_stride(mut self, stride: usize) -> Result<Self, LayoutError> {
        let required = self.packed_size();
        if stride < required {
            return Err(LayoutError::StrideTooSmall { stride, required });
        }
        self.stride = stride;
        Ok(self)
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Bytes from the start of one vertex to the start of the next.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sum of the declared attribute sizes.
    pub fn packed_size(&self) -> usize {
        self.members.iter().map(VertexMember::size).sum()
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[VertexMember] {
        &self.members
    }

    /// Get a member by index.
    pub fn member(&self, index: usize) -> Option<&VertexMember> {
        self.members.get(index)
    }

    /// Find a member and its index by attribute name.
    pub fn find(&self, name: &str) -> Option<(usize, &VertexMember)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, member)| member.attribute.name == name)
    }

    /// Check if this layout declares an attribute with the given name.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Default 2D layout: position (float2), texcoord (float2), color (unorm8x4).
    ///
    /// 20 bytes per vertex.
    pub fn default_2d() -> Arc<Self> {
        Arc::new(
            Self {
                members: vec![
                    VertexMember {
                        attribute: VertexAttribute::position_2d(),
                        offset: 0,
                    },
                    VertexMember {
                        attribute: VertexAttribute::texcoord(),
                        offset: 8,
                    },
                    VertexMember {
                        attribute: VertexAttribute::color(),
                        offset: 16,
                    },
                ],
                stride: 20,
                label: None,
            }
            .with_label("default_2d"),
        )
    }
}
