//! Health-check tuning verification.
//!
//! A backend stanza carries one `default-server fall N inter N rise N` line
//! (fields in any order). This module extracts the triple and compares it
//! against the declared [`HealthCheckSpec`] with exact integer equality.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::ProxyConfig;

/// Declared health-check cadence and thresholds. The config token `inter`
/// maps to `interval` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthCheckSpec {
    /// Probe interval in milliseconds.
    pub interval: u32,

    /// Consecutive failures before a backend is considered down.
    pub fall: u32,

    /// Consecutive successes before a downed backend recovers.
    pub rise: u32,
}

/// Health-check verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum HealthCheckError {
    /// The stanza has no `default-server` line (or the port has no managed
    /// backend stanza at all).
    #[error("no default-server line in backend stanza for port {port}")]
    NotFound { port: u16 },

    /// A `default-server` line exists but one of `fall`/`inter`/`rise` is
    /// missing or non-numeric. Kept distinct from a mismatch so a truncated
    /// line is not reported as tuning drift.
    #[error("default-server line {line:?} for port {port} is missing a usable `{field}` field")]
    Malformed {
        port: u16,
        line: String,
        field: &'static str,
    },

    /// All three fields parsed but differ from the declared values.
    #[error("health check for port {port} is {actual:?}, expected {expected:?}")]
    Mismatch {
        port: u16,
        expected: HealthCheckSpec,
        actual: HealthCheckSpec,
    },
}

/// Compares declared health-check tuning against one parsed stanza.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheckVerifier;

impl HealthCheckVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(
        &self,
        port: u16,
        config: &ProxyConfig,
        expected: &HealthCheckSpec,
    ) -> Result<(), HealthCheckError> {
        let stanza = config
            .backends
            .get(&port)
            .ok_or(HealthCheckError::NotFound { port })?;

        // Stanzas carry at most one default-server line; the first wins.
        let line = stanza
            .iter()
            .find(|line| line.starts_with("default-server"))
            .ok_or(HealthCheckError::NotFound { port })?;

        let actual = HealthCheckSpec {
            interval: extract_field(line, "inter").ok_or_else(|| malformed(port, line, "inter"))?,
            fall: extract_field(line, "fall").ok_or_else(|| malformed(port, line, "fall"))?,
            rise: extract_field(line, "rise").ok_or_else(|| malformed(port, line, "rise"))?,
        };

        if actual == *expected {
            Ok(())
        } else {
            Err(HealthCheckError::Mismatch {
                port,
                expected: *expected,
                actual,
            })
        }
    }
}

/// Key-value token scan: the numeric token following `key`, wherever it
/// appears on the line.
fn extract_field(line: &str, key: &str) -> Option<u32> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == key {
            return tokens.next()?.parse().ok();
        }
    }
    None
}

fn malformed(port: u16, line: &str, field: &'static str) -> HealthCheckError {
    HealthCheckError::Malformed {
        port,
        line: line.to_string(),
        field,
    }
}
