/// Domain-specific error types for kindred
///
/// Classifies failures by how the retrieval boundary must treat them:
/// invalid configuration fails fast, everything backend-shaped is caught
/// at the outermost retrieval call and folded into an empty result set.

#[derive(Debug, thiserror::Error)]
pub enum KindredError {
    /// Unrecognized mode token or malformed parameter. Fail fast, no retry.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Partition resolution failed and no fallback partition exists.
    /// Never fatal for a retrieval; the caller degrades to "no suggestions".
    #[error("Partition routing failed: {0}")]
    Routing(String),

    /// Transport or query failure talking to the search backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Persistence sink rejected a write. Retrieval results are unaffected.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Internal error (bugs, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::backend::BackendError> for KindredError {
    fn from(e: crate::backend::BackendError) -> Self {
        KindredError::Backend(e.to_string())
    }
}

impl From<crate::backend::routing::RoutingError> for KindredError {
    fn from(e: crate::backend::routing::RoutingError) -> Self {
        KindredError::Routing(e.to_string())
    }
}

impl KindredError {
    /// Helper for configuration errors with the offending key named.
    ///
    /// Example:
    /// ```
    /// use kindred::errors::KindredError;
    /// let err = KindredError::config("similarity.mode", "unknown mode token 'fuzzy'");
    /// assert!(err.to_string().contains("similarity.mode"));
    /// ```
    pub fn config(key: &str, message: &str) -> Self {
        KindredError::InvalidConfiguration(format!("{}: {}", key, message))
    }
}
