//! Error types for the permission runtime

/// Result type for permission requests
pub type PermissionResult<T> = Result<T, PermissionError>;

/// Errors raised before a request reaches the host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Request codes must fit in the lower 16 bits
    #[error("Can only use lower 16 bits for requestCode, got {0}")]
    InvalidRequestCode(i32),
}
