//! TCP relay for line-delimited JSON events.

use std::path::PathBuf;

use clap::Parser;
use event_relay::config::Config;
use event_relay::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "event-relay")]
#[clap(about = "Relay line-delimited JSON events between TCP clients")]
struct Cli {
    /// TOML config file (replaces environment configuration)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to
    #[clap(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[clap(short, long)]
    port: Option<u16>,

    /// Maximum number of connected clients
    #[clap(long)]
    max_clients: Option<usize>,

    /// Wire key carrying the event name
    #[clap(long)]
    event_property: Option<String>,

    /// Wire key carrying the argument list
    #[clap(long)]
    arguments_property: Option<String>,

    /// Silently drop lines that are not JSON
    #[clap(long)]
    ignore_non_json: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(key) = self.event_property {
            config.streamer.event_property = key;
        }
        if let Some(key) = self.arguments_property {
            config.streamer.arguments_property = key;
        }
        if self.ignore_non_json {
            config.streamer.ignore_non_json = true;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config()?;

    info!(
        addr = %config.socket_addr_string(),
        max_clients = config.max_clients,
        event_property = %config.streamer.event_property,
        arguments_property = %config.streamer.arguments_property,
        "starting event-relay"
    );

    server::run(config).await
}
