// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Signed tokens carrying an encrypted identity claim.
//!
//! ## Token Flow
//!
//! 1. A login handler hands a [`Subject`] to [`TokenIssuer::create_token`]
//! 2. The issuer encrypts the identifier with the shared claim secret
//!    ([`cipher`]) and signs `{user_id|client_id, iat, exp}` with the private
//!    key from the [`KeyStore`]
//! 3. The client sends `Authorization: Bearer <token>`
//! 4. [`require_token`] verifies signature and expiry with the public key,
//!    decrypts the claim and attaches an [`AuthenticatedSubject`]
//!
//! ## Security
//!
//! - The identifier never appears in plaintext inside the token
//! - Signature and expiry are checked before the claim is decrypted
//! - All 403 rejections look the same to the client
//! - No clock-skew leeway on expiry

pub mod cipher;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod issuer;
pub mod keys;
pub mod middleware;
pub mod verifier;

pub use cipher::{ClaimCipher, CipherError};
pub use claims::{AuthenticatedSubject, SealedClaims, Subject, SubjectId, SubjectKind};
pub use error::{AuthError, IssueError};
pub use extractor::Authenticated;
pub use issuer::{IssueOptions, IssueResponse, IssuedToken, TokenIssuer};
pub use keys::{KeyError, KeySettings, KeySource, KeyStore};
pub use middleware::require_token;
pub use verifier::TokenVerifier;
