// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ENV` | Runtime environment (`local`, `dev`, `development`, anything else) | `production` |
//! | `JWT_PRIVATE_KEY` | Inline PEM signing key (`\n` escapes allowed) | - |
//! | `JWT_PRIVATE_KEY_PATH` | Path to the PEM signing key | Required outside local |
//! | `JWT_PUBLIC_KEY` | Inline PEM verification key | - |
//! | `JWT_PUBLIC_KEY_PATH` | Path to the PEM verification key | Required outside local |
//! | `CLAIM_SECRET` | Shared secret for identity claim encryption | Required |
//! | `JWT_EXPIRES_IN_SECS` | Default token lifetime in seconds | `32400` (9 hours) |
//! | `JWT_ALGORITHM` | Default signing algorithm | `RS256` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! In local environments the key variables are ignored and the development
//! key pair under `keys/dev/` is used instead.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::auth::keys::{KeySettings, KeySource};

pub const APP_ENV_ENV: &str = "APP_ENV";
pub const PRIVATE_KEY_PEM_ENV: &str = "JWT_PRIVATE_KEY";
pub const PRIVATE_KEY_PATH_ENV: &str = "JWT_PRIVATE_KEY_PATH";
pub const PUBLIC_KEY_PEM_ENV: &str = "JWT_PUBLIC_KEY";
pub const PUBLIC_KEY_PATH_ENV: &str = "JWT_PUBLIC_KEY_PATH";
pub const CLAIM_SECRET_ENV: &str = "CLAIM_SECRET";
pub const EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN_SECS";
pub const ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment assumed when `APP_ENV` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Default token lifetime: 9 hours.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 9 * 60 * 60;

pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Development signing key, relative to the repository root.
pub const DEV_PRIVATE_KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/keys/dev/private.pem");

/// Development verification key, relative to the repository root.
pub const DEV_PUBLIC_KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/keys/dev/public.pem");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Runtime environment indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// `local`, `dev` or `development`: repository key pair, dev-only routes.
    Local,
    /// Any other environment name.
    Deployed(String),
}

impl RuntimeEnvironment {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" | "development" => RuntimeEnvironment::Local,
            other => RuntimeEnvironment::Deployed(other.to_string()),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, RuntimeEnvironment::Local)
    }

    pub fn name(&self) -> &str {
        match self {
            RuntimeEnvironment::Local => "local",
            RuntimeEnvironment::Deployed(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Token issuance defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDefaults {
    pub expires_in: Duration,
    pub algorithm: Algorithm,
}

impl Default for TokenDefaults {
    fn default() -> Self {
        Self {
            expires_in: Duration::seconds(DEFAULT_EXPIRES_IN_SECS),
            algorithm: DEFAULT_ALGORITHM,
        }
    }
}

/// Fully resolved application settings.
#[derive(Clone)]
pub struct Settings {
    pub environment: RuntimeEnvironment,
    pub keys: KeySettings,
    /// Shared claim secret. Absence is reported per request as a server fault.
    pub claim_secret: Option<String>,
    pub token_defaults: TokenDefaults,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("environment", &self.environment)
            .field("keys", &self.keys)
            .field("claim_secret", &self.claim_secret.as_ref().map(|_| "<redacted>"))
            .field("token_defaults", &self.token_defaults)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary name → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment =
            RuntimeEnvironment::parse(&get(APP_ENV_ENV).unwrap_or_else(|| DEFAULT_ENVIRONMENT.into()));

        let keys = if environment.is_local() {
            KeySettings {
                private_key: Some(KeySource::File(PathBuf::from(DEV_PRIVATE_KEY_PATH))),
                public_key: Some(KeySource::File(PathBuf::from(DEV_PUBLIC_KEY_PATH))),
            }
        } else {
            KeySettings {
                private_key: key_source(get(PRIVATE_KEY_PEM_ENV), get(PRIVATE_KEY_PATH_ENV)),
                public_key: key_source(get(PUBLIC_KEY_PEM_ENV), get(PUBLIC_KEY_PATH_ENV)),
            }
        };

        let expires_in = match get(EXPIRES_IN_ENV) {
            Some(raw) => {
                let secs: i64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    name: EXPIRES_IN_ENV,
                    reason: format!("{e}"),
                })?;
                if secs <= 0 {
                    return Err(ConfigError::InvalidValue {
                        name: EXPIRES_IN_ENV,
                        reason: "must be a positive number of seconds".to_string(),
                    });
                }
                Duration::seconds(secs)
            }
            None => Duration::seconds(DEFAULT_EXPIRES_IN_SECS),
        };

        let algorithm = match get(ALGORITHM_ENV) {
            Some(raw) => Algorithm::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                name: ALGORITHM_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_ALGORITHM,
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            environment,
            keys,
            claim_secret: get(CLAIM_SECRET_ENV),
            token_defaults: TokenDefaults {
                expires_in,
                algorithm,
            },
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format,
        })
    }
}

/// Inline PEM wins over a path, matching how deployment secrets are injected.
fn key_source(inline_pem: Option<String>, path: Option<String>) -> Option<KeySource> {
    if let Some(pem) = inline_pem {
        return Some(KeySource::Inline(pem.replace("\\n", "\n")));
    }
    path.map(|p| KeySource::File(PathBuf::from(p)))
}
