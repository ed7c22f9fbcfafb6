//! Backend presence/absence matching.
//!
//! # Responsibilities
//! - Build one match rule per declared backend entry
//! - Verify the rules against the `server` lines of one parsed stanza
//! - Support both "all present" and "all absent" verification
//!
//! # Design Decisions
//! - Rules are a tagged enum of explicit predicates over tokenized lines,
//!   never dynamically built regexes, so host strings cannot inject syntax
//! - The historically loose `check` token handling is an explicit
//!   [`CheckPolicy`] per rule variant instead of implicit regex precedence
//! - Verification is pure: no I/O, no shared state between calls

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::ProxyConfig;

pub mod health;

/// One declared upstream target that should appear as a `server` line in a
/// backend stanza.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendEntry {
    /// Hostname or IP, optionally carrying an explicit `host:port` literal.
    pub host: String,

    /// Backend service port; defaults to the proxy's own port when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Backup-only target.
    #[serde(default)]
    pub backup: bool,

    /// Administratively disabled target.
    #[serde(default)]
    pub down: bool,
}

impl BackendEntry {
    /// Plain entry with no flags and no explicit port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            backup: false,
            down: false,
        }
    }
}

/// How a rule treats the optional `check` token on a `server` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// The token may or may not be present.
    #[default]
    Optional,
    /// The token must be present.
    Required,
    /// The token must not be present.
    Forbidden,
}

impl CheckPolicy {
    fn allows(self, present: bool) -> bool {
        match self {
            CheckPolicy::Optional => true,
            CheckPolicy::Required => present,
            CheckPolicy::Forbidden => !present,
        }
    }
}

/// Knobs for the ambiguous corners of line matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchOptions {
    /// `check` handling for a flag-less entry with a bare host.
    pub default_check: CheckPolicy,

    /// `check` handling for a flag-less entry whose host carries an
    /// explicit `host:port` literal.
    pub explicit_port_check: CheckPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            default_check: CheckPolicy::Optional,
            explicit_port_check: CheckPolicy::Forbidden,
        }
    }
}

/// Match rule compiled from one [`BackendEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Flag-less entry, bare host: `server <host>:<port>` with no
    /// backup/disabled qualifiers.
    Default { addr: String, check: CheckPolicy },

    /// Flag-less entry with an explicit port in the host string.
    ExplicitPort { addr: String, check: CheckPolicy },

    /// Entry with backup and/or down set: the matching qualifier tokens
    /// must follow the address, optionally preceded by `check`.
    Qualified {
        addr: String,
        backup: bool,
        down: bool,
    },
}

impl MatchRule {
    /// Build the rule for one entry. `proxy_port` fills in the backend port
    /// when the entry declares none and the host has no explicit port.
    pub fn for_entry(entry: &BackendEntry, proxy_port: u16, options: &MatchOptions) -> Self {
        let explicit = entry.host.contains(':');
        let addr = if explicit {
            entry.host.clone()
        } else {
            format!("{}:{}", entry.host, entry.port.unwrap_or(proxy_port))
        };

        if entry.backup || entry.down {
            MatchRule::Qualified {
                addr,
                backup: entry.backup,
                down: entry.down,
            }
        } else if explicit {
            MatchRule::ExplicitPort {
                addr,
                check: options.explicit_port_check,
            }
        } else {
            MatchRule::Default {
                addr,
                check: options.default_check,
            }
        }
    }

    /// Returns true if one whitespace-normalized `server` line satisfies
    /// this rule.
    pub fn matches(&self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("server") {
            return false;
        }
        let Some(line_addr) = tokens.next() else {
            return false;
        };
        let rest: Vec<&str> = tokens.collect();

        match self {
            MatchRule::Default { addr, check } | MatchRule::ExplicitPort { addr, check } => {
                if line_addr != addr {
                    return false;
                }
                match rest.as_slice() {
                    [] => check.allows(false),
                    ["check"] => check.allows(true),
                    _ => false,
                }
            }
            MatchRule::Qualified { addr, backup, down } => {
                if line_addr != addr {
                    return false;
                }
                // An interposed `check` between the address and the
                // qualifiers is tolerated.
                let qualifiers = match rest.as_slice() {
                    ["check", tail @ ..] => tail,
                    tail => tail,
                };
                let mut want: Vec<&str> = Vec::new();
                if *backup {
                    want.push("backup");
                }
                if *down {
                    want.push("disabled");
                }
                qualifiers.len() == want.len() && want.iter().all(|q| qualifiers.contains(q))
            }
        }
    }
}

/// Backend verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum MatchError {
    /// The requested port has no managed backend section at all.
    #[error("no managed backend section for port {port}")]
    UnknownPort { port: u16 },

    /// A declared entry was not found, or was found when absence was
    /// expected. Carries the offending entry and the observed stanza.
    #[error(
        "backend entry {entry:?} {} in stanza for port {stanza_port}: observed {observed:?}",
        if *expect_absent { "unexpectedly present" } else { "not found" }
    )]
    BackendMismatch {
        stanza_port: u16,
        entry: BackendEntry,
        expect_absent: bool,
        observed: Vec<String>,
    },
}

/// Verifies declared backend entries against one parsed stanza.
#[derive(Debug, Clone, Default)]
pub struct BackendMatcher {
    options: MatchOptions,
}

impl BackendMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Check that every entry is present in (`expect_absent == false`) or
    /// absent from (`expect_absent == true`) the backend stanza for `port`.
    ///
    /// A missing stanza is a total mismatch when presence is expected and
    /// trivially satisfied when absence is expected.
    pub fn verify(
        &self,
        port: u16,
        config: &ProxyConfig,
        expected: &[BackendEntry],
        expect_absent: bool,
    ) -> Result<(), MatchError> {
        let Some(stanza) = config.backends.get(&port) else {
            if expect_absent {
                return Ok(());
            }
            return Err(MatchError::UnknownPort { port });
        };

        let server_lines: Vec<&String> = stanza
            .iter()
            .filter(|line| line.starts_with("server"))
            .collect();

        for entry in expected {
            let rule = MatchRule::for_entry(entry, port, &self.options);
            let found = server_lines.iter().any(|line| rule.matches(line));
            if found == expect_absent {
                return Err(MatchError::BackendMismatch {
                    stanza_port: port,
                    entry: entry.clone(),
                    expect_absent,
                    observed: stanza.clone(),
                });
            }
        }
        Ok(())
    }
}
