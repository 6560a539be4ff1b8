// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{KeyStore, SubjectKind, TokenIssuer, TokenVerifier};
use crate::config::{RuntimeEnvironment, Settings};
use crate::telemetry::ErrorReporter;

#[derive(Clone)]
pub struct AppState {
    pub environment: RuntimeEnvironment,
    pub keys: Arc<KeyStore>,
    pub issuer: Arc<TokenIssuer>,
    pub user_verifier: Arc<TokenVerifier>,
    pub client_verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Wire issuer and verifiers around one shared key store.
    ///
    /// `keys` should already be preloaded.
    pub fn new(settings: &Settings, keys: Arc<KeyStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        let verifier = |kind| {
            Arc::new(
                TokenVerifier::new(keys.clone(), settings.claim_secret.clone(), kind, reporter.clone())
                    .with_algorithm(settings.token_defaults.algorithm),
            )
        };

        Self {
            environment: settings.environment.clone(),
            user_verifier: verifier(SubjectKind::User),
            client_verifier: verifier(SubjectKind::Client),
            issuer: Arc::new(
                TokenIssuer::new(
                    keys.clone(),
                    settings.claim_secret.clone(),
                    reporter.clone(),
                )
                .with_defaults(settings.token_defaults),
            ),
            keys,
        }
    }
}
