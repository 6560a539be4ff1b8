// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token subjects, payload claims and the authenticated identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of principal a token identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// End user
    User,
    /// Client application
    Client,
}

impl SubjectKind {
    /// Name of the payload field carrying the encrypted identifier.
    pub fn claim_field(self) -> &'static str {
        match self {
            SubjectKind::User => "user_id",
            SubjectKind::Client => "client_id",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::User => f.write_str("user"),
            SubjectKind::Client => f.write_str("client"),
        }
    }
}

/// Raw identifier supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Number(i64),
    Text(String),
}

impl SubjectId {
    /// Numbers are always present; text must contain something.
    pub fn is_present(&self) -> bool {
        match self {
            SubjectId::Number(_) => true,
            SubjectId::Text(text) => !text.trim().is_empty(),
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Number(n) => write!(f, "{n}"),
            SubjectId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(value: i64) -> Self {
        SubjectId::Number(value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        SubjectId::Text(value.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        SubjectId::Text(value)
    }
}

/// Principal a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    User(SubjectId),
    Client(SubjectId),
}

impl Subject {
    pub fn user(id: impl Into<SubjectId>) -> Self {
        Subject::User(id.into())
    }

    pub fn client(id: impl Into<SubjectId>) -> Self {
        Subject::Client(id.into())
    }

    pub fn new(kind: SubjectKind, id: impl Into<SubjectId>) -> Self {
        match kind {
            SubjectKind::User => Subject::User(id.into()),
            SubjectKind::Client => Subject::Client(id.into()),
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::User(_) => SubjectKind::User,
            Subject::Client(_) => SubjectKind::Client,
        }
    }

    pub fn id(&self) -> &SubjectId {
        match self {
            Subject::User(id) | Subject::Client(id) => id,
        }
    }
}

/// Token payload.
///
/// Exactly one of `user_id` / `client_id` is set when issuing, always to the
/// encrypted identifier. When verifying, both are optional so a missing field
/// can be told apart from a bad signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl SealedClaims {
    pub fn new(kind: SubjectKind, sealed_id: String, iat: i64, exp: i64) -> Self {
        let (user_id, client_id) = match kind {
            SubjectKind::User => (Some(sealed_id), None),
            SubjectKind::Client => (None, Some(sealed_id)),
        };
        Self {
            user_id,
            client_id,
            iat,
            exp,
        }
    }

    /// Encrypted identifier for the given subject kind, if present.
    pub fn sealed_id(&self, kind: SubjectKind) -> Option<&str> {
        match kind {
            SubjectKind::User => self.user_id.as_deref(),
            SubjectKind::Client => self.client_id.as_deref(),
        }
    }
}

/// Verified identity attached to a request by the token middleware.
///
/// It lives in the request extensions, never in the request body, so a
/// client cannot pre-populate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticatedSubject {
    pub kind: SubjectKind,
    pub id: i64,
}
