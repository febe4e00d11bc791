//! Client error types.
//!
//! The taxonomy separates locally recoverable failures (bad MFA code,
//! cancelled security-key ceremony) from terminal ones (rejected refresh
//! token, failed profile fetch). Terminal failures always arrive after the
//! session has already been cleared.

use thiserror::Error;

/// Which login screen a cleared session should be sent back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBoundary {
    /// Staff login for firm users.
    Staff,
    /// External client-portal login.
    Portal,
}

impl std::fmt::Display for LoginBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginBoundary::Staff => write!(f, "staff"),
            LoginBoundary::Portal => write!(f, "portal"),
        }
    }
}

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Login was rejected. Deliberately generic: the message never says
    /// which field was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A verification or recovery code was rejected. Recoverable; the
    /// flow stays on the code-entry view.
    #[error("Verification code was not accepted")]
    MfaVerification,

    /// The security-key ceremony failed or was cancelled. Recoverable by
    /// explicitly restarting the ceremony.
    #[error("Could not verify the security key")]
    WebAuthnCeremony,

    /// The profile fetch after token issuance failed. Terminal: the
    /// session has been cleared.
    #[error("Could not load the user profile")]
    ProfileFetch,

    /// The session was cleared and the user must sign in again at the
    /// named boundary. Raised after a failed token refresh or a 401 with
    /// nothing left to try.
    #[error("Session expired; sign in again at the {0} login")]
    SessionExpired(LoginBoundary),

    /// An operation was called from the wrong login-flow state.
    #[error("Login flow cannot {0} from its current state")]
    InvalidState(&'static str),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// Session or encoding state error.
    #[error(transparent)]
    Auth(#[from] docket_auth::AuthError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the user can retry in place without restarting the flow.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MfaVerification | Error::WebAuthnCeremony)
    }

    /// Whether this failure ends the session entirely.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::SessionExpired(_) | Error::ProfileFetch)
    }

    /// Check if this is an authentication rejection from the server.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response body from the server.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}
