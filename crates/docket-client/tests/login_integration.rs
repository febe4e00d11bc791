//! Integration tests for the credential-exchange login flow.

mod common;

use async_trait::async_trait;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docket_auth::webauthn::encode;
use docket_auth::AuthError;
use docket_client::{
    Authenticator, Error, LoginOutcome, LoginState, MfaMethod, PlatformAssertion,
    PlatformCeremonyOptions,
};

use common::{profile_json, staff_client, tokens_json};

async fn mount_profile(server: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .and(header("authorization", format!("Bearer {bearer}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_direct_login_authenticates_and_loads_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "admin@test",
            "password": "password123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("access-1", "refresh-1")))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "access-1").await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    let outcome = login.submit_credentials("admin@test", "password123").await.unwrap();

    match outcome {
        LoginOutcome::Authenticated(profile) => assert_eq!(profile.email, "partner@firm.test"),
        LoginOutcome::MfaRequired { .. } => panic!("expected direct authentication"),
    }
    assert_eq!(*login.state(), LoginState::Authenticated);

    let snapshot = client.session_snapshot();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.user.unwrap().display_name, "Pat Partner");
}

#[tokio::test]
async fn test_rejected_login_surfaces_a_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "message": "password mismatch for admin@test" })),
        )
        .mount(&server)
        .await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    let error = login
        .submit_credentials("admin@test", "wrong")
        .await
        .unwrap_err();

    // Never indicate which field was wrong, whatever the server said.
    assert!(matches!(error, Error::InvalidCredentials));
    assert_eq!(error.to_string(), "Invalid email or password");
    assert_eq!(*login.state(), LoginState::Failed);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_single_mfa_method_skips_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "temp_token": "tt-1",
            "mfa_methods": ["totp"],
        })))
        .mount(&server)
        .await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    let outcome = login.submit_credentials("admin@test", "password123").await.unwrap();

    assert!(matches!(outcome, LoginOutcome::MfaRequired { .. }));
    // The picker is skipped entirely: straight to code entry.
    assert_eq!(login.selected_method(), Some(MfaMethod::Totp));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_two_methods_require_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "temp_token": "tt-1",
            "mfa_methods": ["totp", "webauthn"],
        })))
        .mount(&server)
        .await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    login.submit_credentials("admin@test", "password123").await.unwrap();

    assert!(matches!(*login.state(), LoginState::MethodSelection { .. }));
    assert_eq!(login.selected_method(), None);

    login.switch_method(MfaMethod::Totp).unwrap();
    assert_eq!(login.selected_method(), Some(MfaMethod::Totp));
}

#[tokio::test]
async fn test_totp_wrong_code_then_correct_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "temp_token": "tt-1",
            "mfa_methods": ["totp"],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/mfa/verify"))
        .and(body_json(serde_json::json!({ "temp_token": "tt-1", "code": "000000" })))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "message": "invalid code" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/mfa/verify"))
        .and(body_json(serde_json::json!({ "temp_token": "tt-1", "code": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "access-2").await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    login.submit_credentials("admin@test", "password123").await.unwrap();

    login.input_code("000000");
    let error = login.verify_code().await.unwrap_err();
    assert!(matches!(error, Error::MfaVerification));
    assert!(error.is_recoverable());
    // Still on the code-entry view, with the rejected code cleared.
    assert_eq!(login.selected_method(), Some(MfaMethod::Totp));
    assert_eq!(login.entered_code(), Some(""));

    login.input_code("123456");
    let outcome = login.verify_code().await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_recovery_code_verification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "temp_token": "tt-1",
            "mfa_methods": ["totp"],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/mfa/recovery"))
        .and(body_json(serde_json::json!({ "temp_token": "tt-1", "code": "paper-key-0042" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("access-3", "refresh-3")))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "access-3").await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    login.submit_credentials("admin@test", "password123").await.unwrap();

    login.input_code("paper-key-0042");
    let outcome = login.verify_recovery_code().await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
}

/// Fake platform authenticator that signs whatever challenge it is given.
struct FakeKey;

#[async_trait]
impl Authenticator for FakeKey {
    async fn get_assertion(
        &self,
        options: &PlatformCeremonyOptions,
    ) -> docket_auth::Result<PlatformAssertion> {
        assert_eq!(options.rp_id, "firm.example.com");
        assert_eq!(options.timeout_ms, 60_000);
        Ok(PlatformAssertion {
            id: "cred-1".to_string(),
            raw_id: vec![1, 2, 3],
            kind: "public-key".to_string(),
            authenticator_data: vec![0xAA; 5],
            client_data_json: options.challenge.clone(),
            signature: vec![0x51],
            user_handle: None,
        })
    }
}

/// Fake authenticator standing in for a cancelled or timed-out ceremony.
struct AbsentKey;

#[async_trait]
impl Authenticator for AbsentKey {
    async fn get_assertion(
        &self,
        _options: &PlatformCeremonyOptions,
    ) -> docket_auth::Result<PlatformAssertion> {
        Err(AuthError::CeremonyFailed)
    }
}

async fn mount_webauthn_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "temp_token": "tt-wa",
            "mfa_methods": ["webauthn"],
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/webauthn/begin"))
        .and(body_json(serde_json::json!({ "temp_token": "tt-wa" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "challenge": encode(b"challenge-bytes"),
            "rpId": "firm.example.com",
            "allowCredentials": [{ "id": encode(&[1, 2, 3]), "type": "public-key" }],
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_security_key_ceremony_end_to_end() {
    let server = MockServer::start().await;
    mount_webauthn_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/webauthn/complete"))
        .and(body_partial_json(serde_json::json!({
            "temp_token": "tt-wa",
            "credential": {
                "id": "cred-1",
                "rawId": encode(&[1, 2, 3]),
                "type": "public-key",
                "response": {
                    "clientDataJSON": encode(b"challenge-bytes"),
                    "signature": encode(&[0x51]),
                    "userHandle": null,
                },
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("access-4", "refresh-4")))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "access-4").await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    login.submit_credentials("admin@test", "password123").await.unwrap();
    assert_eq!(login.selected_method(), Some(MfaMethod::Webauthn));

    let outcome = login.authenticate_with_key(&FakeKey).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_cancelled_ceremony_is_recoverable() {
    let server = MockServer::start().await;
    mount_webauthn_login(&server).await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    login.submit_credentials("admin@test", "password123").await.unwrap();

    let error = login.authenticate_with_key(&AbsentKey).await.unwrap_err();
    assert!(matches!(error, Error::WebAuthnCeremony));
    assert!(error.is_recoverable());
    // Ceremony can be restarted: still verifying with the key method.
    assert_eq!(login.selected_method(), Some(MfaMethod::Webauthn));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_profile_fetch_failure_clears_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("access-5", "refresh-5")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({ "message": "profile backend down" })),
        )
        .mount(&server)
        .await;

    let client = staff_client(&server);
    let mut login = client.login_flow();
    let error = login
        .submit_credentials("admin@test", "password123")
        .await
        .unwrap_err();

    // Authenticated-but-profile-less is not a usable session.
    assert!(matches!(error, Error::ProfileFetch));
    assert!(error.is_terminal());
    assert_eq!(*login.state(), LoginState::Failed);
    assert!(!client.session().is_authenticated());
}
