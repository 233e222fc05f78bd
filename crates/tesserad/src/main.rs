//! tesserad — the Tessera daemon.
//!
//! Opens the in-memory resource store and serves the REST API on it until
//! interrupted.
//!
//! # Usage
//!
//! ```text
//! tesserad serve --config /etc/tessera/tessera.toml
//! tesserad serve --listen 127.0.0.1:12345 --token secrettoken
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tessera_core::ServerConfig;
use tessera_store::StateStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tesserad=debug,tessera=debug";

#[derive(Parser)]
#[command(name = "tesserad", about = "Tessera resource daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the resource API.
    Serve {
        /// Path to a tessera.toml file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on. Overrides the config file.
        #[arg(long, env = "TESSERA_LISTEN")]
        listen: Option<SocketAddr>,

        /// Shared secret callers must present. Overrides the config file.
        #[arg(long, env = "TESSERA_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            token,
        } => {
            let config = resolve_config(config, listen, token)?;
            init_tracing(cli.log_format, config.log_filter.as_deref())?;
            serve(config).await
        }
    }
}

/// Apply CLI overrides on top of the config file, or the defaults when
/// no file is given. An empty token counts as none.
fn resolve_config(
    path: Option<PathBuf>,
    listen: Option<SocketAddr>,
    token: Option<String>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = listen {
        config.listen = listen;
    }
    if token.is_some() {
        config.auth_token = token;
    }
    config.auth_token = config.auth_token.filter(|t| !t.is_empty());
    Ok(config)
}

fn init_tracing(format: LogFormat, configured: Option<&str>) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = configured.unwrap_or(DEFAULT_LOG_FILTER);
            EnvFilter::try_new(directives)
                .with_context(|| format!("invalid log filter {directives:?}"))?
        }
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("Tessera daemon starting");

    let store = StateStore::open_in_memory()?;
    info!("resource store opened");

    if config.auth_token.is_none() {
        warn!("no auth token configured, the API accepts unauthenticated requests");
    }
    let router = tessera_api::build_router(store, config.auth_token.as_deref());

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %listener.local_addr()?, "API server starting");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("Tessera daemon stopped");
    Ok(())
}
