//! Proxy Configuration Audit Library
//!
//! Parses materialized HAProxy-style configuration text and verifies it
//! against a declarative expectation: which backends must (or must not)
//! appear in each managed stanza, and the health-check tuning each backend
//! stanza must carry. Parsing and verification are pure functions over
//! in-memory text; fetching the text from a node is the orchestration
//! layer's job (see [`client`]).

pub mod audit;
pub mod client;
pub mod config;
pub mod matcher;
pub mod parser;

pub use audit::{AuditReport, Failure};
pub use client::{FileLifecycleClient, ProxyHandle, ProxyLifecycleClient, ProxyOptions};
pub use config::{load_spec, spec_from_str, AuditSpec};
pub use matcher::health::{HealthCheckSpec, HealthCheckVerifier};
pub use matcher::{BackendEntry, BackendMatcher, MatchOptions};
pub use parser::{ConfigParser, ProxyConfig, SectionMarker};
