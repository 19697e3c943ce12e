//! Error types for Argon

use thiserror::Error;

/// Result type alias using ArgonError
pub type Result<T> = std::result::Result<T, ArgonError>;

/// Main error type for Argon operations
#[derive(Debug, Error)]
pub enum ArgonError {
    /// Request referenced a session identifier not present in the registry
    #[error("No such session: {0}")]
    NoSuchSession(String),

    /// CreateSession reused a live session identifier
    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    /// Request violates the session state machine
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Re-entrant Start while negotiation is already in progress
    #[error("Session is already starting: {0}")]
    AlreadyStarting(String),

    /// No capture source matched the requested types
    #[error("No capture sources available")]
    NoSources,

    /// Every per-source stream start failed
    #[error("No stream could be started")]
    StreamStartFailed,

    /// User declined the request; a normal negotiation outcome
    #[error("Cancelled by user")]
    Cancelled,

    /// Capture transport is not initialized
    #[error("Capture backend is not available")]
    Unavailable,

    /// Capture backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// IPC transport error
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ArgonError>,
    },
}

impl ArgonError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an IPC error
    pub fn ipc(msg: impl Into<String>) -> Self {
        Self::Ipc(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Portal result code for this error: 1 for user cancellation, 2 otherwise
    pub fn response_code(&self) -> u32 {
        match self {
            Self::Cancelled => 1,
            _ => 2,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
