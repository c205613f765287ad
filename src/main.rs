// ABOUTME: Entry point for the hookstream binary.
// ABOUTME: Loads .env and CLI overrides, initializes tracing, connects the store, and serves HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hookstream_core::StreamName;
use hookstream_server::{AppState, ServerConfig, create_router};
use hookstream_store::StoreKind;

const DEFAULT_LOG_FILTER: &str = "hookstream=info,tower_http=info";

#[derive(Debug, Parser)]
#[command(name = "hookstream", version, about = "Append JSON records to an ordered log over HTTP")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the ingestion endpoint (the default).
    Serve,
    /// Connect to the configured store, ping it, print the stream length, and exit.
    Check,
}

/// Flags that take precedence over the matching environment variables.
#[derive(Debug, clap::Args)]
struct Overrides {
    /// Socket address to bind [env: HOOKSTREAM_BIND]
    #[arg(long, global = true)]
    bind: Option<SocketAddr>,

    /// Store backend: redis, sqlite, or memory [env: HOOKSTREAM_STORE]
    #[arg(long, global = true)]
    store: Option<StoreKind>,

    /// Stream to append to [env: HOOKSTREAM_STREAM]
    #[arg(long, global = true)]
    stream: Option<StreamName>,

    /// SQLite database file [env: HOOKSTREAM_SQLITE_PATH]
    #[arg(long, global = true)]
    sqlite_path: Option<PathBuf>,
}

impl Overrides {
    fn into_vars(self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        if let Some(bind) = self.bind {
            vars.insert("HOOKSTREAM_BIND", bind.to_string());
        }
        if let Some(store) = self.store {
            vars.insert("HOOKSTREAM_STORE", store.to_string());
        }
        if let Some(stream) = self.stream {
            vars.insert("HOOKSTREAM_STREAM", stream.to_string());
        }
        if let Some(path) = self.sqlite_path {
            vars.insert("HOOKSTREAM_SQLITE_PATH", path.display().to_string());
        }
        vars
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let overrides = cli.overrides.into_vars();
    let config = ServerConfig::from_lookup(|key| {
        overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    })
    .context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Check => check(config).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = hookstream_store::connect(&config.store)
        .await
        .with_context(|| format!("failed to open {} store", config.store.kind()))?;
    let backend = store.backend();

    let state = Arc::new(AppState::from_config(store, &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %config.bind,
        stream = %config.stream,
        field = %config.field,
        backend,
        "hookstream listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("hookstream stopped");
    Ok(())
}

async fn check(config: ServerConfig) -> anyhow::Result<()> {
    let store = hookstream_store::connect(&config.store)
        .await
        .with_context(|| format!("failed to open {} store", config.store.kind()))?;

    tokio::time::timeout(config.store_timeout, store.ping())
        .await
        .context("store ping timed out")?
        .context("store ping failed")?;

    let length = tokio::time::timeout(config.store_timeout, store.len(&config.stream))
        .await
        .context("reading stream length timed out")?
        .context("reading stream length failed")?;

    println!(
        "{} store ok; stream {} holds {} entries",
        store.backend(),
        config.stream,
        length
    );
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
