//! livecount-server: live per-page visitor counts over WebSocket.
//!
//! Widgets join the page they are embedded on and are counted; dashboards
//! monitor pages and only receive counts. Every connection is cleaned up
//! when its socket goes away, however that happens.

mod connection;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use livecount_config::LivecountConfig;
use livecount_presence::PresenceHub;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "livecount-server", about = "Live per-page visitor counter")]
struct Args {
    /// Path to a TOML config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overriding `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding `server.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

/// Load the config with a temporary subscriber installed, so the loader's
/// own logs are not lost before `logging.level` is known.
fn load_config<W>(path: Option<&Path>, writer: W) -> livecount_common::Result<LivecountConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .finish();

    let config = tracing::subscriber::with_default(bootstrap, || {
        livecount_config::load_config(path).inspect_err(|e| tracing::error!("{e}"))
    })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> livecount_common::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref(), std::io::stderr)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("livecount-server listening on {}", addr);

    let hub = PresenceHub::new();

    if config.stats.interval > 0 {
        let stats_hub = hub.clone();
        let every = Duration::from_secs(config.stats.interval);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                let stats = stats_hub.stats().await;
                tracing::debug!(
                    connections = stats.connections,
                    pages = stats.pages,
                    joiners = stats.joiners,
                    subscriptions = stats.subscriptions,
                    "Stats tick"
                );
            }
        });
    }

    let config = Arc::new(config);
    tokio::select! {
        _ = server::serve(listener, hub, config) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested, counts will reset");
        }
    }
    Ok(())
}
