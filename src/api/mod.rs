// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{auth::require_token, state::AppState};

pub mod dev;
pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/session", get(session::current_session))
        .route_layer(from_fn_with_state(
            state.user_verifier.clone(),
            require_token,
        ));

    let client_routes = Router::new()
        .route("/clients/session", get(session::current_session))
        .route_layer(from_fn_with_state(
            state.client_verifier.clone(),
            require_token,
        ));

    let mut v1_routes = Router::new().merge(user_routes).merge(client_routes);

    if state.environment.is_local() {
        v1_routes = v1_routes.route("/dev/tokens", post(dev::mint_token));
    }

    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{IssueOptions, IssueResponse, KeyStore, Subject};
    use crate::config::Settings;
    use crate::telemetry::testing::RecordingReporter;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/primary_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/primary_public.pem");
    const OTHER_PRIVATE_PEM: &str = include_str!("../../tests/fixtures/other_private.pem");
    const SECRET: &str = "router-claim-secret";

    /// Build state the way `main` does. Local environments use the
    /// repository key pair; anything else signs with `private_pem`.
    fn state_with(
        app_env: &str,
        private_pem: &str,
        claim_secret: Option<&str>,
    ) -> (AppState, Arc<RecordingReporter>) {
        let app_env = app_env.to_string();
        let private_pem = private_pem.to_string();
        let secret = claim_secret.map(str::to_string);
        let settings = Settings::from_lookup(move |name| match name {
            "APP_ENV" => Some(app_env.clone()),
            "CLAIM_SECRET" => secret.clone(),
            "JWT_PRIVATE_KEY" => Some(private_pem.clone()),
            "JWT_PUBLIC_KEY" => Some(PUBLIC_PEM.to_string()),
            _ => None,
        })
        .unwrap();

        let keys = Arc::new(KeyStore::new(settings.keys.clone()));
        keys.preload().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let state = AppState::new(&settings, keys, reporter.clone());
        (state, reporter)
    }

    fn state_for(app_env: &str, claim_secret: Option<&str>) -> AppState {
        state_with(app_env, PRIVATE_PEM, claim_secret).0
    }

    fn issue(state: &AppState, subject: Subject) -> String {
        state
            .issuer
            .create_token(&subject, IssueOptions::default())
            .unwrap()
            .token
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn bearer_request(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    fn mint_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/dev/tokens")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let app = router(state_for("local", Some(SECRET)));
        let (status, body) = send(app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reports_missing_secret() {
        let app = router(state_for("local", None));
        let (status, body) = send(app, get_request("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["keys"], "ok");
        assert_eq!(body["checks"]["claim_secret"], "missing");
    }

    #[tokio::test]
    async fn readiness_ok_when_configured() {
        let app = router(state_for("local", Some(SECRET)));
        let (status, body) = send(app, get_request("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(state_for("local", Some(SECRET)));
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn issued_user_token_authenticates() {
        let (state, reporter) = state_with("staging", PRIVATE_PEM, Some(SECRET));
        let token = issue(&state, Subject::user(42_i64));

        let (status, body) = send(router(state), bearer_request("/v1/session", &token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["subject"]["kind"], "user");
        assert_eq!(body["subject"]["id"], 42);
        assert!(reporter.captured().is_empty());
    }

    #[tokio::test]
    async fn issued_client_token_authenticates_client_route() {
        let state = state_for("staging", Some(SECRET));
        let token = issue(&state, Subject::client("9001"));

        let (status, body) =
            send(router(state), bearer_request("/v1/clients/session", &token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"]["kind"], "client");
        assert_eq!(body["subject"]["id"], 9001);
    }

    #[tokio::test]
    async fn blank_identifier_is_not_issued() {
        let (state, reporter) = state_with("staging", PRIVATE_PEM, Some(SECRET));
        let result = state
            .issuer
            .create_token(&Subject::user(""), IssueOptions::default());

        let response = IssueResponse::from(&result);
        assert!(!response.ok);
        assert!(response.token.is_none());
        assert_eq!(
            response.error.as_deref(),
            Some("Missing or invalid required field: user_id")
        );
        assert!(reporter.captured().is_empty());
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let app = router(state_for("staging", Some(SECRET)));
        let (status, body) = send(app, get_request("/v1/session")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);
        assert_eq!(body["errors"][0]["message"], "Authorization token is required");
    }

    #[tokio::test]
    async fn tampered_token_gets_generic_forbidden() {
        let (state, reporter) = state_with("staging", PRIVATE_PEM, Some(SECRET));
        let token = issue(&state, Subject::user(42_i64));

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload = URL_SAFE_NO_PAD.decode(&parts[1]).unwrap();
        payload[2] ^= 0x01;
        parts[1] = URL_SAFE_NO_PAD.encode(payload);
        let tampered = parts.join(".");

        let (status, body) = send(router(state), bearer_request("/v1/session", &tampered)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errors"][0]["message"], "Invalid or expired token");
        assert!(reporter.captured().is_empty());
    }

    #[tokio::test]
    async fn forbidden_responses_are_indistinguishable() {
        let state = state_for("staging", Some(SECRET));
        let foreign = state_for_key(OTHER_PRIVATE_PEM, SECRET);
        let wrong_secret = state_for_key(PRIVATE_PEM, "some-other-secret");

        let tokens = [
            issue(&foreign, Subject::user(1_i64)),
            issue(&state, Subject::client(1_i64)),
            issue(&wrong_secret, Subject::user(1_i64)),
            "garbage".to_string(),
        ];

        let mut bodies = Vec::new();
        for token in &tokens {
            let (status, body) =
                send(router(state.clone()), bearer_request("/v1/session", token)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            bodies.push(body);
        }

        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }

    fn state_for_key(private_pem: &str, claim_secret: &str) -> AppState {
        state_with("staging", private_pem, Some(claim_secret)).0
    }

    #[tokio::test]
    async fn missing_claim_secret_is_server_error() {
        let issuing = state_for("staging", Some(SECRET));
        let (verifying, reporter) = state_with("staging", PRIVATE_PEM, None);
        let token = issue(&issuing, Subject::user(42_i64));

        let (status, body) = send(router(verifying), bearer_request("/v1/session", &token)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
        assert_ne!(body["errors"][0]["message"], "Invalid or expired token");
        assert_eq!(reporter.captured().len(), 1);
    }

    #[tokio::test]
    async fn token_payload_never_contains_plaintext_identifier() {
        let state = state_for("staging", Some(SECRET));
        let token = issue(&state, Subject::user(31337_i64));

        let segment = token.split('.').nth(1).unwrap();
        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap();
        assert!(!payload.contains("31337"));

        let claims: Value = serde_json::from_str(&payload).unwrap();
        assert!(claims["user_id"].is_string());
        assert!(claims.get("client_id").is_none());
    }

    #[tokio::test]
    async fn body_cannot_override_verified_identity() {
        let state = state_for("staging", Some(SECRET));
        let token = issue(&state, Subject::user(42_i64));

        let request = Request::builder()
            .uri("/v1/session")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":1,"kind":"user","id":1}"#))
            .unwrap();

        let (status, body) = send(router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"]["id"], 42);
    }

    #[tokio::test]
    async fn dev_route_absent_outside_local() {
        let app = router(state_for("production", Some(SECRET)));
        let (status, _) = send(app, mint_request(r#"{"kind":"user","id":1}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn minted_user_token_opens_user_session_only() {
        let state = state_for("local", Some(SECRET));
        let (status, body) = send(
            router(state.clone()),
            mint_request(r#"{"kind":"user","id":7}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(router(state.clone()), bearer_request("/v1/session", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"]["id"], 7);
        assert_eq!(body["subject"]["kind"], "user");

        let (status, _) = send(router(state), bearer_request("/v1/clients/session", &token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn dev_route_rejects_blank_id() {
        let app = router(state_for("local", Some(SECRET)));
        let (status, body) = send(app, mint_request(r#"{"kind":"client","id":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Missing or invalid required field: client_id");
    }

    #[tokio::test]
    async fn dev_route_rejects_out_of_range_lifetime() {
        let (state, reporter) = state_with("local", PRIVATE_PEM, Some(SECRET));
        let (status, body) = send(
            router(state),
            mint_request(r#"{"kind":"user","id":1,"expires_in_secs":9223372036854775807}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(
            body["error"],
            "Missing or invalid required field: expires_in_secs"
        );
        assert!(body.get("token").is_none());
        assert!(reporter.captured().is_empty());
    }

    #[tokio::test]
    async fn dev_route_honours_lifetime_override() {
        let state = state_for("local", Some(SECRET));
        let (status, body) = send(
            router(state),
            mint_request(r#"{"kind":"user","id":1,"expires_in_secs":120}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let segment = body["token"].as_str().unwrap().split('.').nth(1).unwrap().to_string();
        let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap();
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            120
        );
    }
}
