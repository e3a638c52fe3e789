#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_DISCOVERY_COMMAND: &str = "scripts/list-ingress-hosts.sh";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_MARKER: &str = "grader";

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;
