use thiserror::Error;

/// Failure taxonomy for everything the client runtime does. Each variant
/// carries a fixed human-readable description; controllers surface these
/// verbatim as their `error_message`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not authenticated. Pair this device with a server first.")]
    NotAuthenticated,
    #[error("Session expired. Pair this device again.")]
    SessionExpired,
    #[error("The requested resource was not found.")]
    NotFound,
    #[error("Too many requests. Try again in a moment.")]
    RateLimited,
    #[error("Server error (status {0}).")]
    Server(u16),
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
    #[error("Network failure: {0}")]
    Network(String),
    /// Validation rejection with the server-provided message, e.g. a wrong
    /// pairing code.
    #[error("{0}")]
    Rejected(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for the errors that invalidate the stored session and require the
    /// device to go through pairing again.
    #[must_use]
    pub fn requires_pairing(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }
}
