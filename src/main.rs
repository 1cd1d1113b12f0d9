use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cookbooks::config::{Config, RunMode};
use cookbooks::AppState;

#[derive(Parser, Debug)]
#[command(name = "cookbooks")]
#[command(author, version, about = "Cookbooks, recipes and an image gallery", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file (read when NODE_ENV=PRODUCTION)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override the listening port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Runtime environment flag
    #[arg(long, env = "NODE_ENV")]
    node_env: Option<String>,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mode = RunMode::from_flag(cli.node_env.as_deref());
    let config = Config::resolve(mode, &cli.config, cli.port)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cookbooks v{} ({:?})", env!("CARGO_PKG_VERSION"), mode);
    match mode {
        RunMode::Production => {
            tracing::info!("Loaded configuration from {}", cli.config.display())
        }
        RunMode::Development => tracing::info!("Development mode, using local defaults"),
    }

    // Initialize the document store
    let db = match cookbooks::db::init(
        &config.database.dbconf,
        config.database.max_connections,
    )
    .await
    {
        Ok(db) => {
            tracing::info!("Document store connected");
            db
        }
        Err(e) => {
            tracing::error!(error = %e, "Document store connection failed");
            return Err(e);
        }
    };

    let state = Arc::new(AppState::new(config.clone(), db));

    // Routes first, then static files as fallback
    let app = cookbooks::api::create_router(state)
        .fallback_service(ServeDir::new(&config.server.public_dir));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
