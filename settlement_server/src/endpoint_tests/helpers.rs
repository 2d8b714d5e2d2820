use actix_http::Request;
use actix_web::{body::to_bytes, http::StatusCode, test, test::TestRequest, App};
use log::debug;
use settle_common::Secret;
use settlement_engine::{events::EventProducers, SqliteDatabase};

use super::mocks::{MockGateway, SharedGateway};
use crate::{
    auth::{Role, TokenIssuer, TokenVerifier},
    config::AuthConfig,
    helpers::calculate_hmac,
    server::{configure_services, ServerContext, SIGNATURE_HEADER},
};

// Test-only secrets. DO NOT re-use these anywhere.
pub const JWT_SECRET: &str = "endpoint-tests-only-jwt-secret-5f0c2a9e71d4";
pub const WEBHOOK_SECRET: &str = "sk_test_endpoint_tests_only";

pub type TestContext = ServerContext<SqliteDatabase, SharedGateway>;

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET).expect("Test JWT secret is too short")
}

pub fn context(db: SqliteDatabase, gateway: MockGateway) -> TestContext {
    ServerContext {
        db,
        gateway: SharedGateway::new(gateway),
        producers: EventProducers::default(),
        verifier: TokenVerifier::new(&get_auth_config()),
        webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
    }
}

pub fn issue_token(sub: i64, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(sub, role, None).expect("Failed to issue token")
}

pub fn bearer(sub: i64, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", issue_token(sub, role)))
}

pub fn signed_webhook(body: &str) -> Request {
    webhook_request(body, Some(calculate_hmac(WEBHOOK_SECRET, body.as_bytes())))
}

pub fn webhook_request(body: &str, signature: Option<String>) -> Request {
    let mut req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((SIGNATURE_HEADER, signature));
    }
    req.to_request()
}

/// Runs one request against a freshly configured app. Errors raised by middleware are rendered the same way the
/// server renders them, so every call yields a status and a body.
pub async fn send(context: TestContext, req: Request) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(move |cfg| configure_services(cfg, context))).await;
    debug!("Making request");
    let res = match test::try_call_service(&app, req).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.expect("Could not read response body");
    (status, String::from_utf8_lossy(&body).into_owned())
}
