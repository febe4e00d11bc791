//! Error types for session and credential state.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while managing session state.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Durable token storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization of persisted tokens failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A base64url field could not be decoded.
    #[error("Invalid base64url data: {0}")]
    Encoding(String),

    /// The security-key ceremony did not produce a credential.
    ///
    /// Covers user cancellation, no matching key, and platform timeouts.
    /// The message is intentionally generic; the user restarts the
    /// ceremony explicitly.
    #[error("Could not verify the security key")]
    CeremonyFailed,
}
