//! HTTP client SDK for the Docket practice-management API.
//!
//! Docket's screens are thin CRUD bindings; the substance of this client
//! is the session and authentication subsystem:
//!
//! - [`login`] — the credential-exchange state machine: password, optional
//!   multi-factor step (code, recovery code, or security key), token
//!   issuance, profile load
//! - [`transport`] — bearer attachment and the single-retry-on-401
//!   refresh saga wrapped around every request
//! - [`portal`] — the parallel, simplified client-portal session domain
//!
//! Session state, durable token storage, and WebAuthn encoding live in
//! [`docket_auth`] and are re-exported here.
//!
//! # Example
//!
//! ```no_run
//! use docket_client::{DocketClient, LoginOutcome};
//!
//! # async fn example() -> docket_client::Result<()> {
//! let client = DocketClient::builder()
//!     .base_url("https://api.firm.example.com")
//!     .build()?;
//!
//! // Restore a previous session, if one was persisted.
//! if client.bootstrap().await?.is_none() {
//!     let mut login = client.login_flow();
//!     match login.submit_credentials("partner@firm.test", "secret").await? {
//!         LoginOutcome::Authenticated(profile) => println!("hello {}", profile.display_name),
//!         LoginOutcome::MfaRequired { methods } => println!("pick one of {:?}", methods),
//!     }
//! }
//!
//! // Subsequent calls carry the bearer token and survive one stale-token
//! // 401 transparently.
//! let matters: serde_json::Value = client.get("matters").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod login;
pub mod portal;
mod transport;
mod types;

pub use client::{ClientBuilder, DocketClient};
pub use error::{Error, LoginBoundary, Result};
pub use login::{LoginFlow, LoginOutcome, LoginState};
pub use portal::PortalClient;

// Session-state and ceremony types callers interact with directly.
pub use docket_auth::{
    Authenticator, MfaChallenge, MfaMethod, PlatformAssertion, PlatformCeremonyOptions, Profile,
    SessionSnapshot, SessionStore, TokenPair,
};
