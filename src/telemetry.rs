// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Logging setup and error reporting.
//!
//! Faults raised inside token issuance or verification are logged locally with
//! a timestamp and forwarded to an [`ErrorReporter`]. Expected outcomes (bad
//! input, rejected credentials) are logged but never reported.

use std::error::Error;

use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use crate::config::LogFormat;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Sink for unexpected internal errors.
pub trait ErrorReporter: Send + Sync {
    /// Record an error, returning the id of the recorded event.
    fn capture_exception(&self, error: &(dyn Error + 'static)) -> Uuid;
}

/// Reporter that records faults as `error` level tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn capture_exception(&self, error: &(dyn Error + 'static)) -> Uuid {
        let event_id = Uuid::new_v4();
        tracing::error!(
            event_id = %event_id,
            error = %error,
            chain = %error_chain(error),
            "captured exception"
        );
        event_id
    }
}

/// Log a fault with its timestamp and hand it to the reporter.
pub fn report_fault(
    reporter: &dyn ErrorReporter,
    component: &'static str,
    error: &(dyn Error + 'static),
) -> Uuid {
    let occurred_at = Utc::now().to_rfc3339();
    let event_id = reporter.capture_exception(error);
    tracing::error!(
        component,
        occurred_at = %occurred_at,
        event_id = %event_id,
        error = %error,
        "internal fault"
    );
    event_id
}

/// Render an error and all of its sources as `outer: inner: ...`.
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Reporter that keeps captured errors in memory.
    #[derive(Default)]
    pub struct RecordingReporter {
        captured: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        pub fn captured(&self) -> Vec<String> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl ErrorReporter for RecordingReporter {
        fn capture_exception(&self, error: &(dyn Error + 'static)) -> Uuid {
            self.captured.lock().unwrap().push(error_chain(error));
            Uuid::new_v4()
        }
    }
}
