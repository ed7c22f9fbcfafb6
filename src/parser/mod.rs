//! Materialized proxy configuration parsing.
//!
//! # Data Flow
//! ```text
//! raw config text (from the orchestrator / a node)
//!     → line scan with an explicit section state machine
//!     → ProxyConfig { listeners, backends } keyed by port
//!     → consumed by matcher / audit
//! ```
//!
//! # Design Decisions
//! - Only sections recognized by the injected [`SectionMarker`] are parsed;
//!   everything else in the file is ignored
//! - A header whose port cannot be parsed drops that section only; parsing
//!   continues and the header is reported back to the caller
//! - Option lines are stored with whitespace normalized to single spaces,
//!   order preserved within a section
//! - `ProxyConfig` is immutable once built; no I/O happens here

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Predicate identifying which `listen`/`backend` sections are managed by
/// this tool. Sections whose header does not contain the marker substring
/// are treated as foreign and skipped entirely.
#[derive(Debug, Clone)]
pub struct SectionMarker(String);

impl SectionMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// Returns true if the header line belongs to a managed section.
    pub fn matches(&self, header: &str) -> bool {
        header.contains(&self.0)
    }
}

impl Default for SectionMarker {
    fn default() -> Self {
        Self::new("scalr")
    }
}

/// One parsed configuration file: port → ordered option lines, split by
/// section kind. Write-once snapshot; discarded after verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProxyConfig {
    /// Option lines of each `listen` stanza, keyed by port.
    pub listeners: BTreeMap<u16, Vec<String>>,

    /// Option lines of each `backend` stanza, keyed by port.
    pub backends: BTreeMap<u16, Vec<String>>,
}

/// A section header that could not be split into `<kind> <name>:<port>`.
///
/// Recoverable: the section is dropped and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("malformed section header {header:?}: expected `<kind> <name>:<port>`")]
pub struct MalformedSectionHeader {
    pub header: String,
}

/// Result of one parse: the extracted sections plus every header that was
/// dropped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub config: ProxyConfig,
    pub malformed: Vec<MalformedSectionHeader>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Listen,
    Backend,
}

/// Accumulator for the section currently being scanned. `None` state means
/// no section is open.
#[derive(Debug)]
struct OpenSection {
    kind: SectionKind,
    port: u16,
    options: Vec<String>,
}

/// Turns raw configuration text into a [`ProxyConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigParser {
    marker: SectionMarker,
}

impl ConfigParser {
    pub fn new(marker: SectionMarker) -> Self {
        Self { marker }
    }

    /// Parse one configuration text blob.
    ///
    /// Empty input (after blank-line stripping) yields empty mappings, not
    /// an error. Malformed headers are logged, collected into the outcome,
    /// and their sections skipped.
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut open: Option<OpenSection> = None;

        for raw in text.lines() {
            let line = raw.trim_end();
            if line.is_empty() {
                continue;
            }

            if is_indented(line) {
                if let Some(section) = open.as_mut() {
                    section.options.push(normalize_whitespace(line));
                }
                // Indented lines outside an open section belong to a skipped
                // or foreign stanza and are discarded.
            } else if let Some(kind) = self.header_kind(line) {
                Self::flush(&mut open, &mut outcome.config);
                match parse_header_port(line) {
                    Ok(port) => {
                        open = Some(OpenSection {
                            kind,
                            port,
                            options: Vec::new(),
                        });
                    }
                    Err(err) => {
                        tracing::warn!(header = %err.header, "dropping unparseable section");
                        outcome.malformed.push(err);
                    }
                }
            } else {
                // A non-indented, non-header line ends the open section.
                Self::flush(&mut open, &mut outcome.config);
            }
        }

        Self::flush(&mut open, &mut outcome.config);
        outcome
    }

    /// Returns the section kind if this line opens a managed section.
    fn header_kind(&self, line: &str) -> Option<SectionKind> {
        let first = line.split_whitespace().next()?;
        let kind = match first {
            "listen" => SectionKind::Listen,
            "backend" => SectionKind::Backend,
            _ => return None,
        };
        self.marker.matches(line).then_some(kind)
    }

    fn flush(open: &mut Option<OpenSection>, config: &mut ProxyConfig) {
        if let Some(section) = open.take() {
            let map = match section.kind {
                SectionKind::Listen => &mut config.listeners,
                SectionKind::Backend => &mut config.backends,
            };
            map.insert(section.port, section.options);
        }
    }
}

/// The port is whatever follows the LAST `:` in the header, so section
/// names may themselves contain colons.
fn parse_header_port(header: &str) -> Result<u16, MalformedSectionHeader> {
    let malformed = || MalformedSectionHeader {
        header: header.to_string(),
    };
    let (_, port) = header.rsplit_once(':').ok_or_else(malformed)?;
    port.trim().parse::<u16>().map_err(|_| malformed())
}

fn is_indented(line: &str) -> bool {
    line.starts_with('\t') || line.starts_with("    ")
}

fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
