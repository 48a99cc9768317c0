//! Checkpoint storage error types.

/// Result type for checkpoint storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during checkpoint storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to initialize the storage backend.
    #[error("store initialization failed: {0}")]
    Init(String),

    /// Artifact not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Artifact payload failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact payload is not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StoreError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Returns true if the error signals a missing artifact.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
