use clap::Parser;
use flare_discovery::{Config, ServiceRuntime, init_tracing};

/// Registry-backed service discovery client
#[derive(Debug, Parser)]
#[command(name = "flare-discovery", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "FLARE_DISCOVERY_CONFIG")]
    config: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.log);
    tracing::info!(
        service = %config.service.name,
        registry = ?config.registry.registry_type,
        "Starting flare-discovery"
    );

    ServiceRuntime::new(config).run().await
}
