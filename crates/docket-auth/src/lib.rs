//! Session state, token storage, and WebAuthn encoding for Docket.
//!
//! The stateful and pure leaves of the authentication subsystem, with no
//! HTTP of their own:
//!
//! - [`session`] — per-domain session store: token lifecycle, user
//!   snapshot, atomic logout
//! - [`storage`] — durable token persistence behind a trait, with the
//!   `{access_token, refresh_token}` allow-list as its only payload
//! - [`webauthn`] — base64url codec and ceremony option/assertion
//!   transforms for the security-key flow
//! - [`types`] — credentials, token pairs, profile, MFA challenge
//!
//! The networked half (login flow, authenticated transport, portal
//! mirror) lives in `docket-client`.

pub mod error;
pub mod session;
pub mod storage;
pub mod types;
pub mod webauthn;

pub use error::{AuthError, Result};
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{
    FileTokenStorage, MemoryTokenStorage, StoredTokens, TokenStorage, PORTAL_NAMESPACE,
    STAFF_NAMESPACE,
};
pub use types::{Credentials, MfaChallenge, MfaMethod, Profile, TokenPair};
pub use webauthn::{Authenticator, PlatformAssertion, PlatformCeremonyOptions, WireAssertion};
