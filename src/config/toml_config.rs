use crate::config::{
    DEFAULT_DISCOVERY_COMMAND, DEFAULT_HOST, DEFAULT_MARKER, DEFAULT_PORT, DEFAULT_SCHEME,
    DEFAULT_STATIC_DIR, DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::{ConfigProvider, FilterPolicy};
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub discovery: DiscoveryConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub command: Vec<String>,
    pub timeout_seconds: u64,
    pub serialize_invocations: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            command: vec![DEFAULT_DISCOVERY_COMMAND.to_string()],
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            serialize_invocations: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Marker,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub scheme: String,
    pub policy: PolicyKind,
    pub marker: String,
    pub denylist: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            policy: PolicyKind::Marker,
            marker: DEFAULT_MARKER.to_string(),
            denylist: Vec::new(),
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DiscoveryError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_host(&self) -> &str {
        &self.server.host
    }

    fn bind_port(&self) -> u16 {
        self.server.port
    }

    fn static_dir(&self) -> &Path {
        &self.server.static_dir
    }

    fn command(&self) -> &[String] {
        &self.discovery.command
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.discovery.timeout_seconds)
    }

    fn serialize_invocations(&self) -> bool {
        self.discovery.serialize_invocations
    }

    fn scheme(&self) -> &str {
        &self.catalog.scheme
    }

    fn filter_policy(&self) -> FilterPolicy {
        let policy = match self.catalog.policy {
            PolicyKind::All => FilterPolicy::include_all(),
            PolicyKind::Marker => FilterPolicy::with_marker(self.catalog.marker.clone()),
        };
        policy.deny(self.catalog.denylist.iter().cloned())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_command("discovery.command", &self.discovery.command)?;
        validation::validate_positive_number(
            "discovery.timeout_seconds",
            self.discovery.timeout_seconds,
            1,
        )?;
        validation::validate_scheme("catalog.scheme", &self.catalog.scheme)?;
        if self.catalog.policy == PolicyKind::Marker {
            validation::validate_non_empty_string("catalog.marker", &self.catalog.marker)?;
        }
        validation::validate_hostnames("catalog.denylist", &self.catalog.denylist)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080
static_dir = "/srv/landing"

[discovery]
command = ["kubectl", "get", "ingress", "-A", "-o", "json"]
timeout_seconds = 5
serialize_invocations = true

[catalog]
scheme = "http"
policy = "marker"
marker = "nbblackbox"
denylist = ["nbblackbox-legacy.example.com"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_host(), "127.0.0.1");
        assert_eq!(config.bind_port(), 8080);
        assert_eq!(config.command().len(), 6);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.serialize_invocations());
        assert_eq!(
            config.filter_policy(),
            FilterPolicy::with_marker("nbblackbox").deny(["nbblackbox-legacy.example.com"])
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.bind_port(), 3000);
        assert_eq!(config.command(), &[DEFAULT_DISCOVERY_COMMAND.to_string()]);
        assert_eq!(config.scheme(), "https");
        assert_eq!(config.filter_policy(), FilterPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_all() {
        let config = TomlConfig::from_toml_str("[catalog]\npolicy = \"all\"\nmarker = \"\"\n").unwrap();

        assert_eq!(config.filter_policy(), FilterPolicy::include_all());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_all_keeps_denylist() {
        let toml_content = r#"
[catalog]
policy = "all"
denylist = ["landing-page.example.com"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.filter_policy(),
            FilterPolicy::include_all().deny(["landing-page.example.com"])
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("INGRESS_CATALOG_TEST_DENY", "grader-old.example.com");

        let toml_content = r#"
[catalog]
denylist = ["${INGRESS_CATALOG_TEST_DENY}", "${INGRESS_CATALOG_TEST_UNSET}"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.catalog.denylist,
            vec!["grader-old.example.com", "${INGRESS_CATALOG_TEST_UNSET}"]
        );

        std::env::remove_var("INGRESS_CATALOG_TEST_DENY");
    }

    #[test]
    fn test_config_validation() {
        let bad_scheme = TomlConfig::from_toml_str("[catalog]\nscheme = \"\"\n").unwrap();
        assert!(bad_scheme.validate().is_err());

        let no_command = TomlConfig::from_toml_str("[discovery]\ncommand = []\n").unwrap();
        assert!(no_command.validate().is_err());

        let empty_marker = TomlConfig::from_toml_str("[catalog]\nmarker = \" \"\n").unwrap();
        assert!(empty_marker.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[catalog\nscheme = 1").unwrap_err();
        assert!(matches!(err, DiscoveryError::ConfigError { .. }));

        let err = TomlConfig::from_toml_str("[catalog]\npolicy = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, DiscoveryError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 9090\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bind_port(), 9090);
        assert_eq!(config.bind_host(), DEFAULT_HOST);
    }
}
