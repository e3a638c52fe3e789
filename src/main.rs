use anyhow::Context;
use clap::Parser;
use ingress_catalog::adapters::{self, ProcessRunner};
use ingress_catalog::core::ConfigProvider;
use ingress_catalog::utils::{logger, validation::Validate};
use ingress_catalog::{CliConfig, DiscoveryService, TomlConfig};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ingress-catalog");

    let config: Box<dyn ConfigProvider> = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path.display()))?;
            config.validate().context("invalid configuration file")?;
            Box::new(config)
        }
        None => {
            cli.validate().context("invalid command line configuration")?;
            Box::new(cli.clone())
        }
    };

    tracing::debug!(
        command = ?config.command(),
        timeout = ?config.timeout(),
        serialized = config.serialize_invocations(),
        policy = ?config.filter_policy(),
        "Discovery settings"
    );

    let discovery = Arc::new(DiscoveryService::from_config(
        &*config,
        Arc::new(ProcessRunner::new()),
    ));
    let app = adapters::router(discovery, config.static_dir());

    let addr = format!("{}:{}", config.bind_host(), config.bind_port());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    adapters::serve(listener, app).await.context("server error")?;

    Ok(())
}
