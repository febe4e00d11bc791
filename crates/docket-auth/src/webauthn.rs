//! WebAuthn assertion ceremony encoding.
//!
//! A pure translation layer between the wire format (base64url strings)
//! and the platform's binary credential types. Only the authentication
//! (assertion) ceremony is covered; enrollment happens elsewhere.
//!
//! The wire side follows the WebAuthn JSON convention: camelCase field
//! names, binary fields base64url-encoded without padding.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Ceremony timeout applied when the server omits one.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// User-verification preference applied when the server omits one.
pub const DEFAULT_USER_VERIFICATION: &str = "preferred";

/// Encode binary data as base64url with padding stripped.
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string, tolerating padded and unpadded input.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text.trim_end_matches('='))
        .map_err(|e| AuthError::Encoding(e.to_string()))
}

// ============================================================================
// Ceremony options: wire -> platform
// ============================================================================

/// Assertion ceremony options as received from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyOptions {
    /// Server challenge, base64url.
    pub challenge: String,
    /// Relying-party identifier; passed through unchanged.
    pub rp_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<String>,
    #[serde(default)]
    pub allow_credentials: Vec<AllowCredential>,
}

/// A credential the server will accept, wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowCredential {
    /// Credential id, base64url.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Ceremony options in the platform's binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCeremonyOptions {
    pub challenge: Vec<u8>,
    pub rp_id: String,
    pub timeout_ms: u64,
    pub user_verification: String,
    pub allow_credentials: Vec<PlatformCredentialRef>,
}

/// A credential reference in the platform's binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCredentialRef {
    pub id: Vec<u8>,
    pub kind: String,
}

/// Decode server ceremony options into platform options.
///
/// Decodes the challenge and every allowed credential id, and fills in
/// the timeout and user-verification defaults when the server omits them.
pub fn build_ceremony_options(options: &CeremonyOptions) -> Result<PlatformCeremonyOptions> {
    let challenge = decode(&options.challenge)?;

    let allow_credentials = options
        .allow_credentials
        .iter()
        .map(|cred| {
            Ok(PlatformCredentialRef {
                id: decode(&cred.id)?,
                kind: cred.kind.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PlatformCeremonyOptions {
        challenge,
        rp_id: options.rp_id.clone(),
        timeout_ms: options.timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
        user_verification: options
            .user_verification
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_VERIFICATION.to_string()),
        allow_credentials,
    })
}

// ============================================================================
// Assertion: platform -> wire
// ============================================================================

/// The assertion produced by the platform ceremony, binary form.
#[derive(Debug, Clone)]
pub struct PlatformAssertion {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub kind: String,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// An assertion encoded for submission to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertion {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub response: WireAssertionResponse,
}

/// Binary assertion fields, base64url-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertionResponse {
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    pub user_handle: Option<String>,
}

/// Encode a platform assertion into its wire form.
pub fn encode_assertion(assertion: &PlatformAssertion) -> WireAssertion {
    WireAssertion {
        id: assertion.id.clone(),
        raw_id: encode(&assertion.raw_id),
        kind: assertion.kind.clone(),
        response: WireAssertionResponse {
            authenticator_data: encode(&assertion.authenticator_data),
            client_data_json: encode(&assertion.client_data_json),
            signature: encode(&assertion.signature),
            user_handle: assertion.user_handle.as_deref().map(encode),
        },
    }
}

// ============================================================================
// Authenticator
// ============================================================================

/// Abstraction over the platform security-key ceremony.
///
/// The real implementation hands the decoded options to the platform and
/// waits for the user to touch a key or complete a biometric check. A
/// ceremony that yields no credential resolves to
/// [`AuthError::CeremonyFailed`]; no automatic retry is attempted.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn get_assertion(
        &self,
        options: &PlatformCeremonyOptions,
    ) -> Result<PlatformAssertion>;
}
