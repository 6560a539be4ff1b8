// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Readiness response with individual component status.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// Individual checks and their results.
    pub checks: ReadyChecks,
}

/// Individual readiness check results.
#[derive(Debug, Serialize)]
pub struct ReadyChecks {
    /// Whether both halves of the key pair are loaded.
    pub keys: String,
    /// Whether the claim secret is configured.
    pub claim_secret: String,
}

/// Simple response for liveness probes.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

fn status_word(ok: bool, failure: &str) -> String {
    if ok { "ok" } else { failure }.to_string()
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 503 when tokens can be neither issued nor verified.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let keys_ok = state.keys.is_loaded();
    let secret_ok = state.user_verifier.has_claim_secret();
    let all_ok = keys_ok && secret_ok;

    let response = ReadyResponse {
        status: status_word(all_ok, "degraded"),
        checks: ReadyChecks {
            keys: status_word(keys_ok, "unavailable"),
            claim_secret: status_word(secret_ok, "missing"),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
