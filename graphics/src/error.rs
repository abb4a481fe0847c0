//! Graphics error types.

use std::fmt;

use sprig_core::mesh::LayoutError;
use sprig_core::texture::TextureDataError;

use crate::backend::BackendError;

/// Broad category of a [`GraphicsError`].
///
/// Bounds and unsupported errors leave the resource untouched and can be
/// retried with different input; driver errors mean the GPU rejected the
/// resource itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Index, size, format or argument out of range.
    Bounds,
    /// The running system lacks a required capability.
    Unsupported,
    /// The driver reported a failure while creating or uploading a resource.
    Driver,
}

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// An index or byte range is outside the resource.
    OutOfBounds(String),
    /// The operation is not valid in the resource's current state.
    InvalidOperation(String),
    /// A requested feature or format is not supported.
    Unsupported(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// The backend reported an error.
    Backend(BackendError),
}

impl GraphicsError {
    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter(_) | Self::OutOfBounds(_) | Self::InvalidOperation(_) => {
                ErrorKind::Bounds
            }
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::ResourceCreationFailed(_) | Self::Backend(_) => ErrorKind::Driver,
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::OutOfBounds(msg) => write!(f, "out of bounds: {msg}"),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            Self::Unsupported(msg) => write!(f, "not supported: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for GraphicsError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl From<LayoutError> for GraphicsError {
    fn from(err: LayoutError) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

impl From<TextureDataError> for GraphicsError {
    fn from(err: TextureDataError) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}
