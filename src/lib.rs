// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sealed Token Server - signed tokens with encrypted identity claims
//!
//! Issues short-lived signed tokens whose subject identifier is encrypted with
//! a pre-shared secret, and verifies them in front of protected routes.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Key store, claim cipher, token issuer and verifier
//! - `config` - Environment-driven settings
//! - `telemetry` - Logging setup and fault reporting

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
pub mod telemetry;
