//! `keygated`: the session token server binary.
//!
//! Usage:
//!   keygated -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/keygate/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use clap::Parser;
use keygate_core::Module;
use tracing::info;

use config::ServerConfig;

/// Session token server.
#[derive(Parser, Debug)]
#[command(name = "keygated", about = "Session token server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Storage, token types, session service.
    let core_config = bootstrap::service_config(&server_config, &cli.listen);
    let session_module = bootstrap::open_session_module(&server_config, &core_config)?;

    let module_routes = vec![(session_module.name(), session_module.routes())];
    let app = routes::build_router(module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("keygated listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
