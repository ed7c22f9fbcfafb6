//! Audit spec validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports non-zero, hosts non-empty)
//! - Detect duplicate and empty proxy declarations
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AuditSpec → Result<(), Vec<ValidationError>>
//! - Runs before a spec is accepted into a verification run

use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::schema::AuditSpec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("managed-section marker is empty; it would match every section")]
    EmptyMarker,

    #[error("proxy declared with port 0")]
    ZeroPort,

    #[error("duplicate proxy declaration for port {port}")]
    DuplicatePort { port: u16 },

    #[error("proxy {port}: backend entry with an empty host")]
    EmptyHost { port: u16 },

    #[error("proxy {port}: host {host:?} carries a non-numeric explicit port")]
    BadExplicitPort { port: u16, host: String },

    #[error("proxy {port}: nothing to verify (no backends, no health check)")]
    EmptyExpectation { port: u16 },
}

/// Semantic checks over a deserialized spec. Collects every violation.
pub fn validate_spec(spec: &AuditSpec) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if spec.marker.is_empty() {
        errors.push(ValidationError::EmptyMarker);
    }

    let mut seen = BTreeSet::new();
    for proxy in &spec.proxies {
        if proxy.port == 0 {
            errors.push(ValidationError::ZeroPort);
        }
        if !seen.insert(proxy.port) {
            errors.push(ValidationError::DuplicatePort { port: proxy.port });
        }
        if proxy.backends.is_empty() && proxy.health_check.is_none() {
            errors.push(ValidationError::EmptyExpectation { port: proxy.port });
        }

        for entry in &proxy.backends {
            if entry.host.is_empty() {
                errors.push(ValidationError::EmptyHost { port: proxy.port });
            } else if let Some((_, explicit)) = entry.host.rsplit_once(':') {
                if explicit.parse::<u16>().is_err() {
                    errors.push(ValidationError::BadExplicitPort {
                        port: proxy.port,
                        host: entry.host.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
