/*
 * Error type shared by every part of the window lifecycle core.
 *
 * Validation failures (`InvalidArgument`, `InvalidOperation`) are raised before any
 * state is touched. `InvalidHandle` covers unknown logical ids as well as operations
 * that need a native handle that does not exist. Failures reported by the native
 * host surface as `OperationFailed` or `WindowCreationFailed`.
 */

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Window creation failed: {0}")]
    WindowCreationFailed(String),
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        PlatformError::OperationFailed(format!("Win32 error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Outcome of a user notification handler that is allowed to fail.
pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error>>;
