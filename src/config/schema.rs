//! Audit spec schema definitions.
//!
//! The spec file is the declarative side of a verification run: which ports
//! are managed, which backends must (or must not) appear in each stanza,
//! and the health-check tuning each stanza must carry. All types derive
//! Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::matcher::health::HealthCheckSpec;
use crate::matcher::{BackendEntry, MatchOptions};

/// Root of one audit spec file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditSpec {
    /// Substring identifying managed sections in the materialized config.
    pub marker: String,

    /// Matching knobs for the ambiguous `check`-token corners.
    pub matching: MatchOptions,

    /// One expectation per proxy port.
    pub proxies: Vec<ProxyExpectation>,
}

impl Default for AuditSpec {
    fn default() -> Self {
        Self {
            marker: "scalr".to_string(),
            matching: MatchOptions::default(),
            proxies: Vec::new(),
        }
    }
}

/// Declared intent for one proxy port.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyExpectation {
    /// Port of the managed `backend` stanza.
    pub port: u16,

    /// When true, the declared backends must NOT appear in the stanza.
    #[serde(default)]
    pub expect_absent: bool,

    /// Backend entries to match against `server` lines.
    #[serde(default)]
    pub backends: Vec<BackendEntry>,

    /// Health-check tuning the stanza's `default-server` line must carry.
    #[serde(default)]
    pub health_check: Option<HealthCheckSpec>,
}
