//! Audit spec loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AuditSpec;
use crate::config::validation::{validate_spec, ValidationError};

/// Error type for spec loading.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse spec file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("spec validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate an audit spec from a TOML file.
pub fn load_spec(path: &Path) -> Result<AuditSpec, SpecError> {
    let content = fs::read_to_string(path)?;
    spec_from_str(&content)
}

/// Parse and validate an audit spec from TOML text.
pub fn spec_from_str(content: &str) -> Result<AuditSpec, SpecError> {
    let spec: AuditSpec = toml::from_str(content)?;
    validate_spec(&spec).map_err(SpecError::Validation)?;
    Ok(spec)
}
