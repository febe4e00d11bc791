//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use url::Url;

use docket_auth::{
    FileTokenStorage, MemoryTokenStorage, Profile, SessionSnapshot, SessionStore, TokenStorage,
    PORTAL_NAMESPACE, STAFF_NAMESPACE,
};

use crate::error::{Error, LoginBoundary, Result};
use crate::login::LoginFlow;
use crate::portal::PortalClient;
use crate::transport::{Transport, UnauthorizedPolicy};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Docket API client for the staff session domain.
///
/// Owns the staff session store and the authenticated transport; every
/// request automatically carries the bearer token and runs the
/// refresh-and-retry saga on 401.
///
/// # Example
///
/// ```no_run
/// use docket_client::DocketClient;
///
/// # async fn example() -> docket_client::Result<()> {
/// let client = DocketClient::builder()
///     .base_url("https://api.firm.example.com")
///     .build()?;
///
/// let mut login = client.login_flow();
/// login.submit_credentials("partner@firm.test", "secret").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocketClient {
    inner: Arc<Transport>,
}

impl DocketClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The staff session store.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    /// A consistent view of the session for UI code.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.inner.session.snapshot()
    }

    /// Start a fresh login flow.
    pub fn login_flow(&self) -> LoginFlow {
        LoginFlow::new(self.clone())
    }

    /// Restore a persisted session and re-derive the user profile.
    ///
    /// Returns the profile when a stored session was found and is still
    /// valid, `None` when there was nothing to restore. A restored pair
    /// whose profile fetch fails is cleared: an authenticated-but-
    /// profile-less state cannot authorize rendering.
    pub async fn bootstrap(&self) -> Result<Option<Profile>> {
        if !self.inner.session.bootstrap()? {
            return Ok(None);
        }
        self.fetch_profile().await.map(Some)
    }

    /// Fetch the user profile and record it on the session.
    ///
    /// Failure is terminal: the session is cleared before the error is
    /// returned.
    pub async fn fetch_profile(&self) -> Result<Profile> {
        match self.inner.get::<Profile>("auth/profile").await {
            Ok(profile) => {
                self.inner.session.set_user(profile.clone());
                Ok(profile)
            }
            Err(Error::SessionExpired(boundary)) => {
                // Transport already cleared the session.
                Err(Error::SessionExpired(boundary))
            }
            Err(error) => {
                tracing::info!(%error, "Profile fetch failed, clearing session");
                self.inner.session.logout()?;
                Err(Error::ProfileFetch)
            }
        }
    }

    /// Clear the session and its durable tokens.
    pub fn logout(&self) -> Result<()> {
        Ok(self.inner.session.logout()?)
    }

    /// Make an authenticated GET request.
    ///
    /// The practice-management screens (clients, matters, billing, ...)
    /// are thin bindings over these two methods.
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

    pub(crate) fn transport(&self) -> &Transport {
        &self.inner
    }
}

/// Builder for creating Docket clients.
///
/// One builder configures both session domains; [`ClientBuilder::build`]
/// produces the staff client and [`ClientBuilder::build_portal`] the
/// portal client. Each gets its own session store over the shared storage
/// backend, under its own namespace.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    storage: Option<Arc<dyn TokenStorage>>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            storage: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Inject a token storage backend.
    ///
    /// Defaults to file storage under the platform data directory. Tests
    /// inject [`MemoryTokenStorage`] here.
    pub fn token_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use in-memory token storage (nothing survives the process).
    pub fn in_memory_storage(self) -> Self {
        self.token_storage(Arc::new(MemoryTokenStorage::new()))
    }

    /// Build the staff client.
    pub fn build(self) -> Result<DocketClient> {
        let transport = self.build_transport(
            STAFF_NAMESPACE,
            UnauthorizedPolicy::RefreshAndRetry,
            LoginBoundary::Staff,
        )?;
        Ok(DocketClient {
            inner: Arc::new(transport),
        })
    }

    /// Build the portal client.
    pub fn build_portal(self) -> Result<PortalClient> {
        let transport = self.build_transport(
            PORTAL_NAMESPACE,
            UnauthorizedPolicy::LogoutImmediately,
            LoginBoundary::Portal,
        )?;
        Ok(PortalClient::new(Arc::new(transport)))
    }

    fn build_transport(
        self,
        namespace: &str,
        policy: UnauthorizedPolicy,
        boundary: LoginBoundary,
    ) -> Result<Transport> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("docket-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        let storage = match self.storage {
            Some(storage) => storage,
            None => Arc::new(FileTokenStorage::default_location()?),
        };

        Ok(Transport {
            http,
            base_url,
            timeout: self.timeout,
            session: Arc::new(SessionStore::new(namespace, storage)),
            policy,
            boundary,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
