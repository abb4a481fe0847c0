//! Backend error types.

/// Errors that can occur in backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// A value passed to the driver was out of range (e.g. a texture too large).
    InvalidValue(String),
    /// An enum or format passed to the driver is not accepted.
    InvalidEnum(String),
    /// The operation is not allowed in the current driver state.
    InvalidOperation(String),
    /// Out of GPU memory.
    OutOfMemory,
    /// The device was lost.
    DeviceLost,
    /// The handle does not name a live resource.
    InvalidHandle,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::InvalidEnum(msg) => write!(f, "invalid enum: {msg}"),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::InvalidHandle => write!(f, "invalid resource handle"),
        }
    }
}

impl std::error::Error for BackendError {}
