use crate::config::{
    DEFAULT_DISCOVERY_COMMAND, DEFAULT_HOST, DEFAULT_MARKER, DEFAULT_SCHEME, DEFAULT_STATIC_DIR,
};
use crate::core::{ConfigProvider, FilterPolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "ingress-catalog")]
#[command(about = "Serves the list of running graders discovered from cluster ingresses")]
pub struct CliConfig {
    #[arg(long, env = "INGRESS_CATALOG_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "INGRESS_CATALOG_PORT", default_value_t = crate::config::DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "INGRESS_CATALOG_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: PathBuf,

    #[arg(
        long,
        env = "INGRESS_CATALOG_TIMEOUT_SECONDS",
        default_value_t = crate::config::DEFAULT_TIMEOUT_SECONDS
    )]
    pub timeout_seconds: u64,

    #[arg(long, env = "INGRESS_CATALOG_SERIALIZE", help = "Run at most one discovery command at a time")]
    pub serialize_invocations: bool,

    #[arg(long, env = "INGRESS_CATALOG_SCHEME", default_value = DEFAULT_SCHEME)]
    pub scheme: String,

    #[arg(long, env = "INGRESS_CATALOG_MARKER", default_value = DEFAULT_MARKER)]
    pub marker: String,

    #[arg(long, help = "List every ingress host instead of filtering by marker")]
    pub include_all: bool,

    #[arg(
        long = "deny",
        env = "INGRESS_CATALOG_DENYLIST",
        value_delimiter = ',',
        help = "Hostname never listed, repeatable"
    )]
    pub denylist: Vec<String>,

    #[arg(short, long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    /// Discovery command and its arguments, after `--`.
    #[arg(last = true, default_value = DEFAULT_DISCOVERY_COMMAND)]
    pub command: Vec<String>,
}

impl ConfigProvider for CliConfig {
    fn bind_host(&self) -> &str {
        &self.host
    }

    fn bind_port(&self) -> u16 {
        self.port
    }

    fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    fn command(&self) -> &[String] {
        &self.command
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn serialize_invocations(&self) -> bool {
        self.serialize_invocations
    }

    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn filter_policy(&self) -> FilterPolicy {
        let policy = if self.include_all {
            FilterPolicy::include_all()
        } else {
            FilterPolicy::with_marker(self.marker.clone())
        };
        policy.deny(self.denylist.iter().cloned())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_command("command", &self.command)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_scheme("scheme", &self.scheme)?;
        if !self.include_all {
            validation::validate_non_empty_string("marker", &self.marker)?;
        }
        validation::validate_hostnames("deny", &self.denylist)?;
        Ok(())
    }
}
