//! Audit spec management subsystem.
//!
//! # Data Flow
//! ```text
//! spec file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AuditSpec (validated, immutable)
//!     → audit::run against a parsed ProxyConfig
//! ```
//!
//! # Design Decisions
//! - A spec is immutable once loaded; each verification run takes its own
//! - All fields have defaults to allow minimal specs
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every violation, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_spec, spec_from_str, SpecError};
pub use schema::{AuditSpec, ProxyExpectation};
pub use validation::{validate_spec, ValidationError};
