//! Wire types for the authentication endpoints.

use docket_auth::{MfaMethod, TokenPair, WireAssertion};
use serde::{Deserialize, Serialize};

/// Response to a password login: either a finished token pair, or a
/// pending multi-factor challenge.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LoginReply {
    MfaRequired {
        #[allow(dead_code)]
        requires_2fa: bool,
        temp_token: String,
        mfa_methods: Vec<MfaMethod>,
    },
    Tokens(TokenPair),
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MfaVerifyRequest {
    pub temp_token: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebAuthnBeginRequest {
    pub temp_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebAuthnCompleteRequest {
    pub temp_token: String,
    pub credential: WireAssertion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_reply_tokens() {
        let reply: LoginReply =
            serde_json::from_str(r#"{"access_token": "a1", "refresh_token": "r1"}"#).unwrap();
        match reply {
            LoginReply::Tokens(pair) => assert_eq!(pair.access_token, "a1"),
            LoginReply::MfaRequired { .. } => panic!("expected tokens"),
        }
    }

    #[test]
    fn test_login_reply_mfa() {
        let reply: LoginReply = serde_json::from_str(
            r#"{"requires_2fa": true, "temp_token": "tt-1", "mfa_methods": ["totp", "webauthn"]}"#,
        )
        .unwrap();
        match reply {
            LoginReply::MfaRequired {
                temp_token,
                mfa_methods,
                ..
            } => {
                assert_eq!(temp_token, "tt-1");
                assert_eq!(mfa_methods, vec![MfaMethod::Totp, MfaMethod::Webauthn]);
            }
            LoginReply::Tokens(_) => panic!("expected MFA challenge"),
        }
    }
}
