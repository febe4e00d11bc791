//! Shared authentication data types.

use serde::{Deserialize, Serialize};

/// Raw login credentials.
///
/// Transient: submitted once and dropped. Never persisted, and the
/// password is redacted from debug output so it cannot leak into logs.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An access/refresh token pair.
///
/// Tokens are opaque bearer strings. A pair is always complete: the API
/// never produces an access token without its refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access_token: access.into(),
            refresh_token: refresh.into(),
        }
    }
}

/// Authenticated user profile.
///
/// A derived, re-fetchable cache: the session is valid with no profile
/// loaded yet, and the profile is never persisted across reloads so a
/// stale role cannot survive undetected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

/// Available multi-factor verification methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MfaMethod {
    /// Time-based one-time code from an authenticator app.
    Totp,
    /// Hardware or biometric security key.
    Webauthn,
}

impl std::fmt::Display for MfaMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MfaMethod::Totp => write!(f, "totp"),
            MfaMethod::Webauthn => write!(f, "webauthn"),
        }
    }
}

/// A pending multi-factor challenge.
///
/// Exists only between password acceptance and multi-factor completion.
/// A login attempt holds either a challenge or a token pair, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    /// Short-lived token scoping the verification calls. Expiry and
    /// single-use semantics are enforced server-side only.
    pub temp_token: String,
    /// Methods the account has enrolled.
    pub methods: Vec<MfaMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("lawyer@firm.test", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("lawyer@firm.test"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_mfa_method_wire_names() {
        let methods: Vec<MfaMethod> = serde_json::from_str(r#"["totp", "webauthn"]"#).unwrap();
        assert_eq!(methods, vec![MfaMethod::Totp, MfaMethod::Webauthn]);
    }

    #[test]
    fn test_token_pair_wire_shape() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "a1", "refresh_token": "r1"}"#).unwrap();
        assert_eq!(pair.access_token, "a1");
        assert_eq!(pair.refresh_token, "r1");
    }
}
