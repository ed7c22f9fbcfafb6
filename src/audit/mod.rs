//! Verification driver.
//!
//! Runs every expectation of an [`AuditSpec`] against one parsed
//! [`ProxyConfig`] and collects all failures, mirroring the validation
//! policy of reporting everything rather than stopping at the first hit.
//! The caller (test harness or CLI) decides whether to abort or continue.

use serde::Serialize;
use thiserror::Error;

use crate::config::schema::AuditSpec;
use crate::matcher::health::{HealthCheckError, HealthCheckVerifier};
use crate::matcher::{BackendMatcher, MatchError};
use crate::parser::ProxyConfig;

/// One failed check, tagged with the port it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub port: u16,
    pub kind: FailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum FailureKind {
    #[error(transparent)]
    Backend(#[from] MatchError),

    #[error(transparent)]
    HealthCheck(#[from] HealthCheckError),
}

/// Outcome of one audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Number of checks executed (backend set + health check per proxy).
    pub checks: usize,
    pub failures: Vec<Failure>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Verify every declared proxy expectation against the parsed config.
pub fn run(spec: &AuditSpec, config: &ProxyConfig) -> AuditReport {
    let matcher = BackendMatcher::with_options(spec.matching);
    let health = HealthCheckVerifier::new();

    let mut checks = 0;
    let mut failures = Vec::new();

    for proxy in &spec.proxies {
        if !proxy.backends.is_empty() {
            checks += 1;
            if let Err(err) =
                matcher.verify(proxy.port, config, &proxy.backends, proxy.expect_absent)
            {
                tracing::debug!(port = proxy.port, error = %err, "backend check failed");
                failures.push(Failure {
                    port: proxy.port,
                    kind: err.into(),
                });
            }
        }

        if let Some(expected) = &proxy.health_check {
            checks += 1;
            if let Err(err) = health.verify(proxy.port, config, expected) {
                tracing::debug!(port = proxy.port, error = %err, "health check failed");
                failures.push(Failure {
                    port: proxy.port,
                    kind: err.into(),
                });
            }
        }
    }

    AuditReport { checks, failures }
}
