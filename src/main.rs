use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use research_portal::config::Config;
use research_portal::AppState;

#[derive(Parser, Debug)]
#[command(name = "research-portal")]
#[command(
    author,
    version,
    about = "University research project matching portal",
    long_about = None
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Hosted database URL
    #[arg(long, env = "SUPABASE_URL")]
    database_url: Option<String>,

    /// Service-role key for the hosted database
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    service_role_key: Option<String>,

    /// Local SQLite URL used when no hosted database is configured
    #[arg(long, env = "PORTAL_SQLITE_URL")]
    sqlite_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?.with_overrides(
        cli.database_url,
        cli.service_role_key,
        cli.sqlite_url,
    );

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

    tracing::info!("Starting research-portal v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database
    let store = research_portal::db::connect(&config).await?;
    tracing::info!(backend = store.backend(), "Database ready");

    let state = Arc::new(AppState::new(config.clone(), store));
    let app = research_portal::api::create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Portal listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
