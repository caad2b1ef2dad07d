use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;

use dm_relay::config::{FileConfig, Profile, RelayDirs, ServerConfig, load_config};
use dm_relay::db::Database;
use dm_relay::repository::ChatRepository;
use dm_relay::{AppState, build_router};

#[derive(Parser)]
#[command(name = "dm-relay")]
#[command(about = "Direct-message relay with live presence and chat history")]
struct Cli {
    /// Custom data directory (defaults to ~/.dm_relay)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Configuration profile (local, server)
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Setup logging
    let default_directive = if args.debug {
        "dm_relay=debug,tower_http=debug,info"
    } else {
        "dm_relay=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    info!("Starting dm-relay");

    let dirs = RelayDirs::new(args.data_dir)?;
    let mut file_config: FileConfig = load_config(&dirs.data_dir, args.profile.as_ref())
        .extract()
        .context("Failed to load configuration")?;

    // CLI flags win over config.toml and env vars
    if let Some(host) = args.host {
        file_config.server.host = Some(host);
    }
    if let Some(port) = args.port {
        file_config.server.port = Some(port);
    }
    let server_config = ServerConfig::from_file(&file_config.server);

    info!("Initializing database...");
    let db = Database::new(&dirs).await?;
    let repository = ChatRepository::new(db.pool.clone());

    let addr = format!("{}:{}", server_config.host, server_config.port)
        .parse::<SocketAddr>()
        .context("Invalid listen address")?;
    let state = AppState::new(server_config, repository);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("dm-relay listening on http://{}", actual_addr);
    info!("API endpoints:");
    info!("  POST   /register            - Create account");
    info!("  POST   /login               - Check credentials");
    info!("  POST   /get-all-user/{{id}}   - List contacts");
    info!("  POST   /add-message         - Append to history");
    info!("  POST   /get-message         - Load conversation");
    info!("  GET    /ws                  - Presence and live messages");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    db.pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
