// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance.
//!
//! ## Steps
//!
//! 1. Validate the subject identifier
//! 2. Resolve the signing key
//! 3. Encrypt the identifier with the shared claim secret
//! 4. Build a payload holding only the encrypted identifier, `iat` and `exp`
//! 5. Sign
//!
//! Every failure is caught here. Faults are logged with a timestamp and
//! forwarded to the error reporter before being returned as an [`IssueError`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::Serialize;

use super::cipher;
use super::claims::{SealedClaims, Subject};
use super::error::IssueError;
use super::keys::KeyStore;
use crate::config::TokenDefaults;
use crate::telemetry::{report_fault, ErrorReporter};

/// Per-call overrides of the issuer defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueOptions {
    pub expires_in: Option<Duration>,
    pub algorithm: Option<Algorithm>,
}

impl IssueOptions {
    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// Expiration (seconds since epoch)
    pub expires_at: i64,
}

/// Transport shape of an issuance result: `{ok, token}` or `{ok, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<IssuedToken, IssueError>> for IssueResponse {
    fn from(result: &Result<IssuedToken, IssueError>) -> Self {
        match result {
            Ok(issued) => Self {
                ok: true,
                token: Some(issued.token.clone()),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                token: None,
                error: Some(e.public_message()),
            },
        }
    }
}

/// Builds signed tokens around an encrypted identity claim.
pub struct TokenIssuer {
    keys: Arc<KeyStore>,
    claim_secret: Option<String>,
    defaults: TokenDefaults,
    reporter: Arc<dyn ErrorReporter>,
}

impl TokenIssuer {
    pub fn new(
        keys: Arc<KeyStore>,
        claim_secret: Option<String>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            keys,
            claim_secret: claim_secret.filter(|s| !s.is_empty()),
            defaults: TokenDefaults::default(),
            reporter,
        }
    }

    /// Replace the default lifetime and algorithm.
    pub fn with_defaults(mut self, defaults: TokenDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Issue a token for `subject`.
    pub fn create_token(
        &self,
        subject: &Subject,
        options: IssueOptions,
    ) -> Result<IssuedToken, IssueError> {
        match self.issue(subject, options) {
            Ok(issued) => {
                tracing::debug!(
                    subject_kind = %subject.kind(),
                    expires_at = issued.expires_at,
                    "Token issued"
                );
                Ok(issued)
            }
            Err(e) if e.is_fault() => {
                report_fault(self.reporter.as_ref(), "token_issuer", &e);
                Err(e)
            }
            Err(e) => {
                tracing::debug!(subject_kind = %subject.kind(), error = %e, "Token request rejected");
                Err(e)
            }
        }
    }

    fn issue(&self, subject: &Subject, options: IssueOptions) -> Result<IssuedToken, IssueError> {
        let kind = subject.kind();
        if !subject.id().is_present() {
            return Err(IssueError::InvalidPayload {
                field: kind.claim_field(),
            });
        }

        let private_key = self
            .keys
            .private_key()
            .map_err(IssueError::SigningUnavailable)?;

        let claim_secret = self
            .claim_secret
            .as_deref()
            .ok_or(IssueError::ClaimSecretMissing)?;

        let sealed_id = cipher::encrypt(claim_secret, &subject.id().to_string())
            .map_err(IssueError::ClaimEncryptionFailed)?;

        let algorithm = options.algorithm.unwrap_or(self.defaults.algorithm);
        let expires_in = options.expires_in.unwrap_or(self.defaults.expires_in);
        let issued_at = Utc::now().timestamp();
        let claims = SealedClaims::new(
            kind,
            sealed_id,
            issued_at,
            issued_at.saturating_add(expires_in.num_seconds()),
        );

        let encoding_key = private_key
            .encoding_key(algorithm)
            .map_err(IssueError::SigningFailed)?;
        let token = encode(&Header::new(algorithm), &claims, &encoding_key)
            .map_err(IssueError::SigningFailed)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }
}
