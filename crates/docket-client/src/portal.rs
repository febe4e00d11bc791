//! Client-portal session domain.
//!
//! A structurally parallel but deliberately simpler mirror of the staff
//! client for the external, lower-trust portal tenant: single-step login
//! with no multi-factor machinery, its own storage namespace, and a 401
//! policy that clears the session immediately instead of attempting a
//! refresh. The asymmetry with the staff domain is intentional observed
//! behavior, not an oversight to smooth over.

use std::sync::Arc;

use url::Url;

use docket_auth::{Credentials, Profile, SessionSnapshot, SessionStore, TokenPair};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Docket API client for the client-portal session domain.
///
/// Built with [`crate::ClientBuilder::build_portal`].
#[derive(Clone)]
pub struct PortalClient {
    inner: Arc<Transport>,
}

impl PortalClient {
    pub(crate) fn new(inner: Arc<Transport>) -> Self {
        Self { inner }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The portal session store.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    /// A consistent view of the session for UI code.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.inner.session.snapshot()
    }

    /// Single-step portal login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
        let credentials = Credentials::new(email, password);
        let reply = self
            .inner
            .post_public::<TokenPair, _>("portal/auth/login", &credentials)
            .await;

        let pair = match reply {
            Ok(pair) => pair,
            Err(error) if error.is_unauthorized() => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        };

        self.inner.session.set_tokens(pair)?;
        self.fetch_profile().await
    }

    /// Restore a persisted portal session and re-derive the profile.
    pub async fn bootstrap(&self) -> Result<Option<Profile>> {
        if !self.inner.session.bootstrap()? {
            return Ok(None);
        }
        self.fetch_profile().await.map(Some)
    }

    /// Fetch the portal user profile and record it on the session.
    ///
    /// Failure clears the session, same as the staff domain.
    pub async fn fetch_profile(&self) -> Result<Profile> {
        match self.inner.get::<Profile>("auth/profile").await {
            Ok(profile) => {
                self.inner.session.set_user(profile.clone());
                Ok(profile)
            }
            Err(Error::SessionExpired(boundary)) => Err(Error::SessionExpired(boundary)),
            Err(error) => {
                tracing::info!(%error, "Portal profile fetch failed, clearing session");
                self.inner.session.logout()?;
                Err(Error::ProfileFetch)
            }
        }
    }

    /// Clear the portal session and its durable tokens.
    pub fn logout(&self) -> Result<()> {
        Ok(self.inner.session.logout()?)
    }

    /// Make an authenticated GET request.
    ///
    /// On 401 the portal session is cleared immediately and the call
    /// fails with [`Error::SessionExpired`]; no refresh is attempted.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.inner.get(path).await
    }

    /// Make an authenticated POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.inner.post(path, body).await
    }
}
