//! Authenticated request transport.
//!
//! Every outbound call passes through here. The transport attaches the
//! current bearer token and, for the staff domain, runs the single-retry
//! saga on 401: refresh the pair once, re-issue the original request once,
//! and hand the result back transparently. The portal domain clears its
//! session on 401 with no refresh attempt.
//!
//! The retry flag lives in a per-request context created fresh for each
//! call, never on shared state. Refresh is deliberately not single-flight:
//! two requests that 401 concurrently will each call the refresh endpoint
//! (last-write-wins on the stored pair).

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use url::Url;

use docket_auth::{SessionStore, TokenPair};

use crate::error::{Error, ErrorResponse, LoginBoundary, Result};
use crate::types::RefreshRequest;

/// What to do when an authenticated request comes back 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnauthorizedPolicy {
    /// Refresh the token pair once, then retry the original request once.
    RefreshAndRetry,
    /// Clear the session immediately; no refresh attempt.
    LogoutImmediately,
}

/// Per-request saga state. Fresh for every call.
struct RequestContext {
    retried: bool,
}

impl RequestContext {
    fn new() -> Self {
        Self { retried: false }
    }
}

/// Transport for one session domain.
pub(crate) struct Transport {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) session: Arc<SessionStore>,
    pub(crate) policy: UnauthorizedPolicy,
    pub(crate) boundary: LoginBoundary,
}

impl Transport {
    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.base_url
            .join(&format!("api/v1/{}", path))
            .map_err(Error::from)
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await
    }

    /// Make an authenticated POST request.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| Error::Config(format!("Failed to serialize request body: {}", e)))?;
        self.send(Method::POST, path, Some(body)).await
    }

    /// Make an unauthenticated POST request.
    ///
    /// Used by the login and verification endpoints, which must never
    /// trigger the 401 refresh saga: a 401 there means the submitted
    /// credential was rejected, not that the session went stale.
    pub(crate) async fn post_public<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// The authenticated send saga.
    ///
    /// The body is held as a JSON value so the retried request re-issues
    /// exactly what the original sent.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = self.url(path)?;
        let mut ctx = RequestContext::new();

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .timeout(self.timeout);
            if let Some(token) = self.session.access_token() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                if ctx.retried {
                    // Already retried once; propagate, never loop.
                    return Err(self.extract_error(response).await);
                }
                ctx.retried = true;

                match self.policy {
                    UnauthorizedPolicy::RefreshAndRetry => {
                        self.refresh().await?;
                        tracing::debug!(%url, "Retrying request with refreshed token");
                        continue;
                    }
                    UnauthorizedPolicy::LogoutImmediately => {
                        tracing::info!(boundary = %self.boundary, "401 received, clearing session");
                        self.session.logout()?;
                        return Err(Error::SessionExpired(self.boundary));
                    }
                }
            }

            return self.handle_response(response).await;
        }
    }

    /// Exchange the refresh token for a new pair and swap it in.
    ///
    /// Any failure here is terminal: the session is cleared and the caller
    /// gets [`Error::SessionExpired`] pointing at this domain's boundary.
    pub(crate) async fn refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.session.refresh_token() else {
            self.session.logout()?;
            return Err(Error::SessionExpired(self.boundary));
        };

        let url = self.url("auth/refresh")?;
        let outcome = async {
            let response = self
                .http
                .post(url)
                .timeout(self.timeout)
                .json(&RefreshRequest { refresh_token })
                .send()
                .await?;
            self.handle_response::<TokenPair>(response).await
        }
        .await;

        match outcome {
            Ok(pair) => {
                self.session.set_tokens(pair)?;
                tracing::debug!(boundary = %self.boundary, "Token pair refreshed");
                Ok(())
            }
            Err(error) => {
                tracing::info!(boundary = %self.boundary, %error, "Token refresh failed, clearing session");
                self.session.logout()?;
                Err(Error::SessionExpired(self.boundary))
            }
        }
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(err) => Error::Api {
                status,
                message: err.message,
            },
            Err(_) => Error::Api {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }
}
