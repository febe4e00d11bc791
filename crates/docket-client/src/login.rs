//! Credential exchange: the login state machine.
//!
//! Drives a user from raw credentials through an optional multi-factor
//! challenge to an authenticated session:
//!
//! ```text
//! Idle -> Submitting -> Authenticated
//!                    -> Failed
//!                    -> MethodSelection -> Verifying -> Authenticated
//!                    -> Verifying (single method auto-selected)
//! ```
//!
//! Verification failures are absorbed here and leave the flow in
//! `Verifying` for another attempt; terminal failures (profile fetch,
//! refresh) clear the session before surfacing. The server is
//! authoritative for credential validity and rate limiting.

use docket_auth::webauthn::{self, CeremonyOptions};
use docket_auth::{
    AuthError, Authenticator, Credentials, MfaChallenge, MfaMethod, PlatformAssertion,
    PlatformCeremonyOptions, Profile, TokenPair,
};

use crate::client::DocketClient;
use crate::error::{Error, Result};
use crate::types::{LoginReply, MfaVerifyRequest, WebAuthnBeginRequest, WebAuthnCompleteRequest};

/// Where the login flow currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginState {
    /// No attempt in progress.
    Idle,
    /// Credentials submitted, awaiting the server.
    Submitting,
    /// More than one MFA method is available; the user must pick one.
    MethodSelection { challenge: MfaChallenge },
    /// A method is selected; awaiting a code, recovery code, or key touch.
    Verifying {
        challenge: MfaChallenge,
        method: MfaMethod,
        /// Text the user has typed so far. Cleared on verification
        /// failure and on method switch so partial secrets never leak
        /// across views.
        entered_code: String,
    },
    /// Tokens issued and profile loaded.
    Authenticated,
    /// The attempt ended; the user must resubmit credentials.
    Failed,
}

/// Result of an operation that can complete a login.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Session is authenticated and the profile is loaded.
    Authenticated(Profile),
    /// A multi-factor step is required before tokens are issued.
    MfaRequired { methods: Vec<MfaMethod> },
}

/// One login attempt against the staff session domain.
///
/// Create with [`DocketClient::login_flow`]. The flow writes into the
/// client's session store on success; the flow object itself holds only
/// UI-facing state.
pub struct LoginFlow {
    client: DocketClient,
    state: LoginState,
}

impl LoginFlow {
    pub(crate) fn new(client: DocketClient) -> Self {
        Self {
            client,
            state: LoginState::Idle,
        }
    }

    /// Current state, for the UI to render from.
    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Methods available on the pending challenge, if any.
    pub fn available_methods(&self) -> Option<&[MfaMethod]> {
        match &self.state {
            LoginState::MethodSelection { challenge }
            | LoginState::Verifying { challenge, .. } => Some(&challenge.methods),
            _ => None,
        }
    }

    /// The method currently being verified, if any.
    pub fn selected_method(&self) -> Option<MfaMethod> {
        match &self.state {
            LoginState::Verifying { method, .. } => Some(*method),
            _ => None,
        }
    }

    /// Code text entered so far, if on a code-entry view.
    pub fn entered_code(&self) -> Option<&str> {
        match &self.state {
            LoginState::Verifying { entered_code, .. } => Some(entered_code),
            _ => None,
        }
    }

    /// Record code text as the user types it.
    pub fn input_code(&mut self, text: impl Into<String>) {
        if let LoginState::Verifying { entered_code, .. } = &mut self.state {
            *entered_code = text.into();
        }
    }

    /// Submit email and password.
    ///
    /// No local validation beyond format; the server decides. A rejection
    /// surfaces as [`Error::InvalidCredentials`] with a message that never
    /// says which field was wrong.
    pub async fn submit_credentials(&mut self, email: &str, password: &str) -> Result<LoginOutcome> {
        match self.state {
            LoginState::Idle | LoginState::Failed => {}
            _ => return Err(Error::InvalidState("submit credentials")),
        }
        self.state = LoginState::Submitting;
        tracing::debug!("Submitting credentials");

        let credentials = Credentials::new(email, password);
        let reply = self
            .client
            .transport()
            .post_public::<LoginReply, _>("auth/login", &credentials)
            .await;

        match reply {
            Ok(LoginReply::Tokens(pair)) => self.finish(pair).await,
            Ok(LoginReply::MfaRequired {
                temp_token,
                mfa_methods,
                ..
            }) => {
                let challenge = MfaChallenge {
                    temp_token,
                    methods: mfa_methods.clone(),
                };
                // A single available method skips the picker entirely.
                if let [only] = challenge.methods[..] {
                    tracing::debug!(method = %only, "MFA required, single method auto-selected");
                    self.state = LoginState::Verifying {
                        challenge,
                        method: only,
                        entered_code: String::new(),
                    };
                } else {
                    tracing::debug!("MFA required, awaiting method selection");
                    self.state = LoginState::MethodSelection { challenge };
                }
                Ok(LoginOutcome::MfaRequired {
                    methods: mfa_methods,
                })
            }
            Err(error) => {
                self.state = LoginState::Failed;
                if error.is_unauthorized() {
                    Err(Error::InvalidCredentials)
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Pick a verification method, or change to a different one.
    ///
    /// Discards any code text entered under the previous method.
    pub fn switch_method(&mut self, method: MfaMethod) -> Result<()> {
        let challenge = match &self.state {
            LoginState::MethodSelection { challenge }
            | LoginState::Verifying { challenge, .. } => challenge.clone(),
            _ => return Err(Error::InvalidState("switch method")),
        };
        if !challenge.methods.contains(&method) {
            return Err(Error::InvalidState("switch to an unavailable method"));
        }

        self.state = LoginState::Verifying {
            challenge,
            method,
            entered_code: String::new(),
        };
        Ok(())
    }

    /// Abandon the multi-factor step and return to `Idle`.
    ///
    /// The temp token is discarded client-side only; its server-side
    /// expiry is out of our hands.
    pub fn cancel_mfa(&mut self) {
        if !matches!(self.state, LoginState::Authenticated) {
            self.state = LoginState::Idle;
        }
    }

    /// Verify the entered time-based code.
    ///
    /// On rejection the flow stays in `Verifying` with the entered text
    /// cleared; the user may retry without limit (the server rate-limits).
    pub async fn verify_code(&mut self) -> Result<LoginOutcome> {
        let (temp_token, code) = match &self.state {
            LoginState::Verifying {
                challenge,
                method: MfaMethod::Totp,
                entered_code,
            } => (challenge.temp_token.clone(), entered_code.clone()),
            _ => return Err(Error::InvalidState("verify a code")),
        };
        self.verify_at("auth/mfa/verify", temp_token, code).await
    }

    /// Verify the entered recovery code.
    ///
    /// Same contract as [`LoginFlow::verify_code`]; recovery codes are
    /// single-use server-side.
    pub async fn verify_recovery_code(&mut self) -> Result<LoginOutcome> {
        let (temp_token, code) = match &self.state {
            LoginState::Verifying {
                challenge,
                entered_code,
                ..
            } => (challenge.temp_token.clone(), entered_code.clone()),
            _ => return Err(Error::InvalidState("verify a recovery code")),
        };
        self.verify_at("auth/mfa/recovery", temp_token, code).await
    }

    async fn verify_at(
        &mut self,
        path: &str,
        temp_token: String,
        code: String,
    ) -> Result<LoginOutcome> {
        let reply = self
            .client
            .transport()
            .post_public::<TokenPair, _>(path, &MfaVerifyRequest { temp_token, code })
            .await;

        match reply {
            Ok(pair) => self.finish(pair).await,
            Err(Error::Api {
                status: 400..=499, ..
            }) => {
                // Stay in Verifying; drop the rejected code text.
                self.input_code("");
                tracing::debug!("Verification code rejected");
                Err(Error::MfaVerification)
            }
            Err(error) => Err(error),
        }
    }

    /// Fetch and decode the security-key challenge for this attempt.
    pub async fn begin_webauthn(&mut self) -> Result<PlatformCeremonyOptions> {
        let temp_token = match &self.state {
            LoginState::Verifying {
                challenge,
                method: MfaMethod::Webauthn,
                ..
            } => challenge.temp_token.clone(),
            _ => return Err(Error::InvalidState("begin a security-key ceremony")),
        };

        let options = self
            .client
            .transport()
            .post_public::<CeremonyOptions, _>("auth/webauthn/begin", &WebAuthnBeginRequest {
                temp_token,
            })
            .await?;

        Ok(webauthn::build_ceremony_options(&options)?)
    }

    /// Submit a completed security-key assertion.
    ///
    /// On rejection the flow stays in `Verifying`; the user restarts the
    /// ceremony explicitly.
    pub async fn complete_webauthn(&mut self, assertion: &PlatformAssertion) -> Result<LoginOutcome> {
        let temp_token = match &self.state {
            LoginState::Verifying {
                challenge,
                method: MfaMethod::Webauthn,
                ..
            } => challenge.temp_token.clone(),
            _ => return Err(Error::InvalidState("complete a security-key ceremony")),
        };

        let reply = self
            .client
            .transport()
            .post_public::<TokenPair, _>(
                "auth/webauthn/complete",
                &WebAuthnCompleteRequest {
                    temp_token,
                    credential: webauthn::encode_assertion(assertion),
                },
            )
            .await;

        match reply {
            Ok(pair) => self.finish(pair).await,
            Err(Error::Api {
                status: 400..=499, ..
            }) => {
                tracing::debug!("Security-key assertion rejected");
                Err(Error::WebAuthnCeremony)
            }
            Err(error) => Err(error),
        }
    }

    /// Run the full security-key ceremony against a platform authenticator.
    pub async fn authenticate_with_key(
        &mut self,
        authenticator: &dyn Authenticator,
    ) -> Result<LoginOutcome> {
        let options = self.begin_webauthn().await?;
        let assertion = match authenticator.get_assertion(&options).await {
            Ok(assertion) => assertion,
            Err(AuthError::CeremonyFailed) => {
                // Recoverable: stay in Verifying, no automatic retry.
                tracing::debug!("Security-key ceremony yielded no credential");
                return Err(Error::WebAuthnCeremony);
            }
            Err(error) => return Err(error.into()),
        };
        self.complete_webauthn(&assertion).await
    }

    /// Hand the issued pair to the session store and load the profile.
    async fn finish(&mut self, pair: TokenPair) -> Result<LoginOutcome> {
        self.client.session().set_tokens(pair)?;

        match self.client.fetch_profile().await {
            Ok(profile) => {
                self.state = LoginState::Authenticated;
                tracing::debug!("Login complete");
                Ok(LoginOutcome::Authenticated(profile))
            }
            Err(error) => {
                // fetch_profile already cleared the session.
                self.state = LoginState::Failed;
                Err(error)
            }
        }
    }
}
