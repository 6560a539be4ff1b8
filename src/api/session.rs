// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;

use crate::auth::{Authenticated, AuthenticatedSubject};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub ok: bool,
    pub subject: AuthenticatedSubject,
}

/// Echo the verified subject back to the caller.
pub async fn current_session(Authenticated(subject): Authenticated) -> Json<SessionResponse> {
    Json(SessionResponse { ok: true, subject })
}
