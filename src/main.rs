mod config;
mod handler;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;

use std::net::SocketAddr;

use crate::config::ProxyConfig;
use crate::handler::state::ProxyState;

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Args {
    #[arg(long, default_value = "config.toml")]
    config_file: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, action)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args)?;

    let config_contents = std::fs::read_to_string(&args.config_file)
        .with_context(|| format!("Couldn't read config file \"{}\"", args.config_file))?;
    let config = ProxyConfig::from_toml(&config_contents)?;
    tracing::debug!(?config);

    let metrics_socket_addr = SocketAddr::new(config.listen_address, config.metrics_port);
    metrics::init(metrics_socket_addr)?;

    let proxy_socket_addr = SocketAddr::new(config.listen_address, config.proxy_port);
    let state = ProxyState::new(config)?;

    let listener = tokio::net::TcpListener::bind(proxy_socket_addr)
        .await
        .with_context(|| format!("Couldn't bind {proxy_socket_addr}"))?;

    tracing::info!("Starting server on {proxy_socket_addr}...");
    tracing::info!(%metrics_socket_addr, "Serving Prometheus metrics");

    axum::serve(listener, handler::routes::router(state)).await?;

    Ok(())
}
