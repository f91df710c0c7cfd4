use anyhow::Context;
use clap::Parser;
use processos_api::api::{spawn_store_connection, ApiServer, AppState};
use processos_api::config::{CorsPolicy, ServerConfig};
use processos_api::store::InMemoryProcessStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// HTTP API for billing workflow processes
#[derive(Parser)]
#[command(name = "processos-api")]
#[command(about = "Serve search, update and dashboard endpoints over the processos collection", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    mongodb_uri: Option<String>,

    /// Database holding the processos collection
    #[arg(long)]
    database: Option<String>,

    /// Comma separated list of allowed browser origins, or * for any
    #[arg(long)]
    cors_origins: Option<String>,

    /// Serve from an empty in-memory store instead of MongoDB
    #[arg(long)]
    in_memory: bool,
}

impl Cli {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(uri) = self.mongodb_uri {
            config.mongodb_uri = Some(uri);
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(origins) = self.cors_origins {
            config.cors = CorsPolicy::parse(&origins);
        }
        config
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("processos-api started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let in_memory = cli.in_memory;
    let config = cli.apply(ServerConfig::from_env().context("Invalid configuration")?);

    let state = AppState::new();
    if in_memory {
        warn!("Serving from an in-memory store; data is lost on exit");
        state.attach(Arc::new(InMemoryProcessStore::new()));
    } else {
        spawn_store_connection(state.clone(), &config);
    }

    ApiServer::new(state, config).start(shutdown_signal()).await
}
