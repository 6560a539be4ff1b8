// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the verified subject.
//!
//! ```rust,ignore
//! async fn session(Authenticated(subject): Authenticated) -> impl IntoResponse {
//!     // subject.id is the decrypted identifier
//! }
//! ```
//!
//! The extractor never looks at headers or the body. It only reads what
//! [`require_token`](super::middleware::require_token) attached, so a route
//! mounted without the middleware fails closed with a 500.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedSubject};

pub struct Authenticated(pub AuthenticatedSubject);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedSubject>()
            .copied()
            .map(Authenticated)
            .ok_or_else(|| {
                tracing::error!(path = %parts.uri.path(), "Route is not behind the token middleware");
                AuthError::ServerMisconfigured("route is not behind the token middleware".to_string())
            })
    }
}
