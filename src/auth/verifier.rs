// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! ## Order of checks
//!
//! 1. Credential present (`Authorization` header) → else 401
//! 2. Claim secret configured → else 500
//! 3. Signature and expiry valid against the verification key → else 403
//! 4. Expected identifier claim present → else 403
//! 5. Claim decrypts to a numeric identifier → else 403
//!
//! There is no clock-skew leeway: a token is usable strictly before `exp`.
//! The algorithm is fixed by configuration; the token header is never trusted
//! to pick it.

use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, Validation};

use super::cipher::ClaimCipher;
use super::claims::{AuthenticatedSubject, SealedClaims, SubjectKind};
use super::error::AuthError;
use super::keys::KeyStore;
use crate::config::DEFAULT_ALGORITHM;
use crate::telemetry::{report_fault, ErrorReporter};

/// Only this exact prefix is stripped; anything else is the credential itself.
const BEARER_PREFIX: &str = "Bearer ";

/// Verifies tokens for one subject kind.
pub struct TokenVerifier {
    keys: Arc<KeyStore>,
    claim_secret: Option<String>,
    subject_kind: SubjectKind,
    algorithm: Algorithm,
    reporter: Arc<dyn ErrorReporter>,
}

impl TokenVerifier {
    pub fn new(
        keys: Arc<KeyStore>,
        claim_secret: Option<String>,
        subject_kind: SubjectKind,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            keys,
            claim_secret: claim_secret.filter(|s| !s.is_empty()),
            subject_kind,
            algorithm: DEFAULT_ALGORITHM,
            reporter,
        }
    }

    /// Accept tokens signed with `algorithm` instead of the default.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn subject_kind(&self) -> SubjectKind {
        self.subject_kind
    }

    pub fn has_claim_secret(&self) -> bool {
        self.claim_secret.is_some()
    }

    /// Verify the raw `Authorization` header value.
    ///
    /// Rejections are logged here; faults are also reported.
    pub fn verify(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<AuthenticatedSubject, AuthError> {
        match self.check(authorization) {
            Ok(subject) => Ok(subject),
            Err(e) if e.is_fault() => {
                report_fault(self.reporter.as_ref(), "token_verifier", &e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    reason = e.error_code(),
                    subject_kind = %self.subject_kind,
                    "Token rejected"
                );
                Err(e)
            }
        }
    }

    fn check(&self, authorization: Option<&HeaderValue>) -> Result<AuthenticatedSubject, AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredential)?;
        let token = extract_token(header)?;

        let secret = self.claim_secret.as_deref().ok_or_else(|| {
            AuthError::ServerMisconfigured("claim secret is not configured".to_string())
        })?;

        let public_key = self
            .keys
            .public_key()
            .map_err(|e| AuthError::ServerMisconfigured(e.to_string()))?;
        let decoding_key = public_key
            .decoding_key(self.algorithm)
            .map_err(|e| AuthError::ServerMisconfigured(format!("verification key unusable: {e}")))?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;

        let claims = decode::<SealedClaims>(token, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token signature or expiry check failed");
                AuthError::InvalidOrExpiredToken
            })?
            .claims;

        // `decode` still accepts `exp == now`; the token is only valid before `exp`.
        if claims.exp <= Utc::now().timestamp() {
            tracing::debug!(exp = claims.exp, "Token expired");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let sealed_id = claims
            .sealed_id(self.subject_kind)
            .ok_or(AuthError::ClaimMissing(self.subject_kind.claim_field()))?;

        let cipher = ClaimCipher::new(secret)
            .map_err(|e| AuthError::ServerMisconfigured(e.to_string()))?;
        let plaintext = cipher
            .decrypt(sealed_id)
            .map_err(|_| AuthError::ClaimDecryptionFailed)?;

        let id = plaintext
            .parse::<i64>()
            .map_err(|_| AuthError::ClaimDecryptionFailed)?;

        Ok(AuthenticatedSubject {
            kind: self.subject_kind,
            id,
        })
    }
}

/// Pull the credential out of the header value.
///
/// A value that is not visible ASCII cannot be a compact token, so it is
/// rejected like any other invalid token.
fn extract_token(header: &HeaderValue) -> Result<&str, AuthError> {
    let value = header
        .to_str()
        .map_err(|_| AuthError::InvalidOrExpiredToken)?;
    Ok(value.strip_prefix(BEARER_PREFIX).unwrap_or(value))
}
