//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use docket_client::{ClientBuilder, DocketClient, PortalClient};
use docket_auth::{MemoryTokenStorage, TokenStorage};
use wiremock::MockServer;

pub fn staff_client(server: &MockServer) -> DocketClient {
    staff_client_with_storage(server, Arc::new(MemoryTokenStorage::new()))
}

pub fn staff_client_with_storage(
    server: &MockServer,
    storage: Arc<dyn TokenStorage>,
) -> DocketClient {
    ClientBuilder::new()
        .base_url(server.uri())
        .token_storage(storage)
        .build()
        .unwrap()
}

pub fn portal_client_with_storage(
    server: &MockServer,
    storage: Arc<dyn TokenStorage>,
) -> PortalClient {
    ClientBuilder::new()
        .base_url(server.uri())
        .token_storage(storage)
        .build_portal()
        .unwrap()
}

pub fn tokens_json(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({ "access_token": access, "refresh_token": refresh })
}

pub fn profile_json() -> serde_json::Value {
    serde_json::json!({
        "id": "u-1",
        "email": "partner@firm.test",
        "display_name": "Pat Partner",
        "role": "attorney",
    })
}
