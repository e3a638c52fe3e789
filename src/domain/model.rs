use serde::{Deserialize, Serialize};

/// One entry as emitted by the ingress listing command. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIngressRecord {
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub url: String,
}

/// Services in the order the command listed their ingress hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    pub entries: Vec<ServiceEntry>,
}

impl ServiceCatalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter()
    }
}

/// Captured result of one finished external process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Which ingress hosts make it into the catalog.
///
/// The denylist always applies. Without a marker every other well-formed host is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Substring the first DNS label must contain.
    pub marker: Option<String>,
    /// Exact hostnames never listed.
    pub denylist: Vec<String>,
}

impl FilterPolicy {
    pub fn include_all() -> Self {
        Self {
            marker: None,
            denylist: Vec::new(),
        }
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: Some(marker.into()),
            denylist: Vec::new(),
        }
    }

    pub fn deny<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist.extend(hosts.into_iter().map(Into::into));
        self
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::with_marker("grader")
    }
}
