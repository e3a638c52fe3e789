pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{router, ProcessRunner};
pub use crate::core::{catalog::CatalogBuilder, discovery::DiscoveryService, invoker::DiscoveryInvoker};
pub use domain::model::{FilterPolicy, ServiceCatalog, ServiceEntry};
pub use utils::error::{DiscoveryError, ErrorKind, Result};
