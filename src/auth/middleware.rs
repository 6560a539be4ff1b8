// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification middleware for Axum.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/v1/session", get(session))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         user_verifier.clone(),
//!         require_token,
//!     ));
//! ```
//!
//! On success the verified [`AuthenticatedSubject`] is inserted into the
//! request extensions. This is a security boundary: the identity never goes
//! into the request body or any other client-controlled data, so a caller
//! cannot smuggle in an identifier of its own. Handlers read it through the
//! [`Authenticated`](super::Authenticated) extractor.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::verifier::TokenVerifier;

/// Reject the request unless it carries a valid token for the verifier's
/// subject kind.
pub async fn require_token(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = verifier.verify(request.headers().get(AUTHORIZATION));

    match verified {
        Ok(subject) => {
            // Replace anything an earlier layer may have put there.
            request.extensions_mut().insert(subject);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
