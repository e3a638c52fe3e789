use crate::core::{FilterPolicy, RawIngressRecord, ServiceCatalog, ServiceEntry};
use crate::utils::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// Dot-separated DNS labels; a label never starts or ends with a dash.
static HOST_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .expect("static regex")
});

/// Why a record was left out of the catalog. Never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MalformedHost,
    MarkerMissing,
    Denylisted,
    NoServiceName,
}

/// Turns raw command output into a [`ServiceCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    scheme: String,
    marker: Option<String>,
    denylist: HashSet<String>,
}

impl CatalogBuilder {
    pub fn new(scheme: impl Into<String>, policy: FilterPolicy) -> Self {
        Self {
            scheme: scheme.into(),
            marker: policy.marker,
            denylist: policy.denylist.into_iter().collect(),
        }
    }

    pub fn parse_records(raw: &str) -> Result<Vec<RawIngressRecord>> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses and transforms in one go. Any parse failure fails the whole catalog.
    pub fn build(&self, raw: &str) -> Result<ServiceCatalog> {
        let records = Self::parse_records(raw)?;
        let total = records.len();
        let catalog = self.build_from_records(&records);

        tracing::debug!(
            "Built catalog with {} of {} ingress records",
            catalog.len(),
            total
        );
        Ok(catalog)
    }

    pub fn build_from_records(&self, records: &[RawIngressRecord]) -> ServiceCatalog {
        let entries = records
            .iter()
            .filter_map(|record| match self.entry_for(&record.host) {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    tracing::debug!("Skipping ingress host '{}': {:?}", record.host, reason);
                    None
                }
            })
            .collect();

        ServiceCatalog { entries }
    }

    pub fn entry_for(&self, host: &str) -> std::result::Result<ServiceEntry, SkipReason> {
        if !HOST_SHAPE.is_match(host) {
            return Err(SkipReason::MalformedHost);
        }

        if let Some(marker) = &self.marker {
            if !first_label(host).contains(marker.as_str()) {
                return Err(SkipReason::MarkerMissing);
            }
        }
        if self.denylist.contains(host) {
            return Err(SkipReason::Denylisted);
        }

        let name = derive_name(host).ok_or(SkipReason::NoServiceName)?;

        Ok(ServiceEntry {
            name: name.to_string(),
            url: format!("{}://{}", self.scheme, host),
        })
    }
}

fn first_label(host: &str) -> &str {
    host.split('.').next().unwrap_or_default()
}

/// `grader-dbis.example.com` -> `dbis`: second dash token of the first label.
pub fn derive_name(host: &str) -> Option<&str> {
    first_label(host)
        .split('-')
        .nth(1)
        .filter(|name| !name.is_empty())
}
