// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Development-only token minting.
//!
//! Mounted only when `APP_ENV` is a local environment. Lets the frontend and
//! manual testing obtain tokens without a login flow.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Duration;
use serde::Deserialize;

use crate::auth::{
    IssueError, IssueOptions, IssueResponse, IssuedToken, Subject, SubjectId, SubjectKind,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MintTokenRequest {
    pub kind: SubjectKind,
    pub id: SubjectId,
    /// Overrides the configured lifetime.
    #[serde(default)]
    pub expires_in_secs: Option<i64>,
}

pub async fn mint_token(
    State(state): State<AppState>,
    Json(request): Json<MintTokenRequest>,
) -> (StatusCode, Json<IssueResponse>) {
    let mut options = IssueOptions::default();
    if let Some(secs) = request.expires_in_secs {
        let Some(expires_in) = Duration::try_seconds(secs) else {
            let rejected: Result<IssuedToken, IssueError> = Err(IssueError::InvalidPayload {
                field: "expires_in_secs",
            });
            return (StatusCode::BAD_REQUEST, Json(IssueResponse::from(&rejected)));
        };
        options = options.expires_in(expires_in);
    }

    let result = state
        .issuer
        .create_token(&Subject::new(request.kind, request.id), options);

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) if e.is_fault() => StatusCode::INTERNAL_SERVER_ERROR,
        Err(_) => StatusCode::BAD_REQUEST,
    };

    (status, Json(IssueResponse::from(&result)))
}
