//! Proxy lifecycle collaborator.
//!
//! The orchestration layer that actually materializes proxy definitions on
//! target nodes lives outside this crate. The audit core only needs the
//! seam below: declare/update/remove a proxy, and hand back the raw
//! configuration text a node ended up with.
//!
//! [`FileLifecycleClient`] is the in-repo implementation used by the CLI
//! and tests: declarations are kept in memory and the materialized text is
//! read from a local file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::matcher::health::HealthCheckSpec;
use crate::matcher::BackendEntry;

/// Options attached to a proxy declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyOptions {
    pub health_check: Option<HealthCheckSpec>,
}

/// Handle to a declared proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHandle {
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no declared proxy for port {port}")]
    UnknownProxy { port: u16 },

    #[error("proxy for port {port} is already declared")]
    AlreadyDeclared { port: u16 },

    #[error("failed to read materialized config: {0}")]
    Io(#[from] std::io::Error),
}

/// Seam to the external role/orchestration API. Assumed synchronous and
/// reliable here; retry and timeout policy belongs to the orchestration
/// layer itself.
pub trait ProxyLifecycleClient {
    fn add_proxy(
        &mut self,
        port: u16,
        backends: Vec<BackendEntry>,
        options: ProxyOptions,
    ) -> Result<ProxyHandle, ClientError>;

    fn edit_proxy(
        &mut self,
        port: u16,
        backends: Vec<BackendEntry>,
        options: ProxyOptions,
    ) -> Result<(), ClientError>;

    fn delete_proxy(&mut self, port: u16) -> Result<(), ClientError>;

    /// The raw configuration text the orchestrator materialized, as the
    /// parser consumes it.
    fn materialized_config_text(&self) -> Result<String, ClientError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Declaration {
    backends: Vec<BackendEntry>,
    options: ProxyOptions,
}

/// File-backed client: declarations live in memory, materialized text comes
/// from a local path (for example a config fetched to disk beforehand).
#[derive(Debug, Clone)]
pub struct FileLifecycleClient {
    path: PathBuf,
    declared: BTreeMap<u16, Declaration>,
}

impl FileLifecycleClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declared: BTreeMap::new(),
        }
    }

    /// Ports currently declared through this client.
    pub fn declared_ports(&self) -> Vec<u16> {
        self.declared.keys().copied().collect()
    }

    /// Backends most recently declared for a port.
    pub fn declared_backends(&self, port: u16) -> Option<&[BackendEntry]> {
        self.declared.get(&port).map(|d| d.backends.as_slice())
    }

    /// Health-check tuning most recently declared for a port.
    pub fn declared_health_check(&self, port: u16) -> Option<&HealthCheckSpec> {
        self.declared.get(&port)?.options.health_check.as_ref()
    }
}

impl ProxyLifecycleClient for FileLifecycleClient {
    fn add_proxy(
        &mut self,
        port: u16,
        backends: Vec<BackendEntry>,
        options: ProxyOptions,
    ) -> Result<ProxyHandle, ClientError> {
        if self.declared.contains_key(&port) {
            return Err(ClientError::AlreadyDeclared { port });
        }
        self.declared.insert(port, Declaration { backends, options });
        Ok(ProxyHandle { port })
    }

    fn edit_proxy(
        &mut self,
        port: u16,
        backends: Vec<BackendEntry>,
        options: ProxyOptions,
    ) -> Result<(), ClientError> {
        let declaration = self
            .declared
            .get_mut(&port)
            .ok_or(ClientError::UnknownProxy { port })?;
        *declaration = Declaration { backends, options };
        Ok(())
    }

    fn delete_proxy(&mut self, port: u16) -> Result<(), ClientError> {
        self.declared
            .remove(&port)
            .map(|_| ())
            .ok_or(ClientError::UnknownProxy { port })
    }

    fn materialized_config_text(&self) -> Result<String, ClientError> {
        Ok(fs::read_to_string(&self.path)?)
    }
}
