// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance and verification errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::cipher::CipherError;
use super::keys::KeyError;

/// Message returned for every 403 outcome, whichever check failed.
const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Why a token could not be issued.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// Caller supplied an empty identifier or an unusable option
    #[error("Missing or invalid required field: {field}")]
    InvalidPayload { field: &'static str },

    /// Signing key could not be resolved
    #[error("signing key unavailable")]
    SigningUnavailable(#[source] KeyError),

    /// No claim secret configured
    #[error("claim secret is not configured")]
    ClaimSecretMissing,

    /// Identifier could not be encrypted
    #[error("claim encryption failed")]
    ClaimEncryptionFailed(#[source] CipherError),

    /// Signing library refused to produce a token
    #[error("token signing failed")]
    SigningFailed(#[source] jsonwebtoken::errors::Error),
}

impl IssueError {
    /// Faults are unexpected and get reported; `InvalidPayload` is routine.
    pub fn is_fault(&self) -> bool {
        !matches!(self, IssueError::InvalidPayload { .. })
    }

    /// Message safe to hand back to the issuance caller.
    pub fn public_message(&self) -> String {
        match self {
            IssueError::InvalidPayload { .. } => self.to_string(),
            _ => "Token could not be issued".to_string(),
        }
    }
}

/// Verification rejection.
///
/// Variants map to 401 / 403 / 500. The detail carried by
/// `ServerMisconfigured` and the distinction between the 403 variants are for
/// logs only; clients see one generic message per status.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization token is required")]
    MissingCredential,

    /// Server lacks the claim secret or verification key
    #[error("token verification is misconfigured: {0}")]
    ServerMisconfigured(String),

    /// Bad signature, expired, malformed or wrong algorithm
    #[error("token failed signature or expiry validation")]
    InvalidOrExpiredToken,

    /// Signed payload lacks the expected identifier field
    #[error("token has no {0} claim")]
    ClaimMissing(&'static str),

    /// Identifier claim could not be decrypted or is not numeric
    #[error("token claim could not be decrypted")]
    ClaimDecryptionFailed,
}

#[derive(Serialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Serialize)]
struct AuthErrorBody {
    ok: bool,
    errors: Vec<ErrorMessage>,
}

impl AuthError {
    /// Internal reason code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::ServerMisconfigured(_) => "server_misconfigured",
            AuthError::InvalidOrExpiredToken => "invalid_or_expired_token",
            AuthError::ClaimMissing(_) => "claim_missing",
            AuthError::ClaimDecryptionFailed => "claim_decryption_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential => StatusCode::UNAUTHORIZED,
            AuthError::InvalidOrExpiredToken
            | AuthError::ClaimMissing(_)
            | AuthError::ClaimDecryptionFailed => StatusCode::FORBIDDEN,
            AuthError::ServerMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side faults, as opposed to routine client rejections.
    pub fn is_fault(&self) -> bool {
        matches!(self, AuthError::ServerMisconfigured(_))
    }

    /// Message sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Authorization token is required",
            AuthError::ServerMisconfigured(_) => "Authentication is not available",
            AuthError::InvalidOrExpiredToken
            | AuthError::ClaimMissing(_)
            | AuthError::ClaimDecryptionFailed => INVALID_TOKEN_MESSAGE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            ok: false,
            errors: vec![ErrorMessage {
                message: self.public_message().to_string(),
            }],
        });
        (status, body).into_response()
    }
}
