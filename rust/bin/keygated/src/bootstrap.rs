//! Bootstrap: first-start checks and service assembly.
//!
//! When keygated starts:
//! 1. Verify the config is usable, or refuse to start.
//! 2. Open the SQLite store, seed default token types on an empty database
//!    and load the token type registry. An empty registry is fatal.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use keygate_core::ServiceConfig;
use keygate_sql::{SQLStore, SqliteStore};
use session::SessionModule;
use session::service::SessionConfig;
use session::service::mailer::LogMailer;
use session::service::password::Argon2Scheme;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.issuer.trim().is_empty() {
        anyhow::bail!("JWT issuer is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.cookie.name.trim().is_empty() {
        anyhow::bail!("Refresh cookie name is empty in configuration.");
    }
    let names = &config.token_names;
    let mut all = [&names.access, &names.refresh, &names.confirm, &names.reset];
    if all.iter().any(|n| n.is_empty()) {
        anyhow::bail!("Token type names must not be empty.");
    }
    all.sort();
    if all.windows(2).any(|w| w[0] == w[1]) {
        anyhow::bail!("Token type names must be distinct.");
    }
    Ok(())
}

/// Storage paths derived from the server config.
pub fn service_config(config: &ServerConfig, listen: &str) -> ServiceConfig {
    ServiceConfig {
        data_dir: Some(PathBuf::from(&config.storage.data_dir)),
        sqlite_path: config.storage.sqlite_path.as_ref().map(PathBuf::from),
        listen: listen.to_string(),
    }
}

pub fn session_config(config: &ServerConfig) -> SessionConfig {
    SessionConfig {
        issuer: config.jwt.issuer.clone(),
        token_names: config.token_names.clone(),
        cookie: config.cookie.clone(),
        expose_email_tokens: config.http.expose_email_tokens,
    }
}

/// Open storage and build the session module.
pub fn open_session_module(
    config: &ServerConfig,
    core: &ServiceConfig,
) -> anyhow::Result<SessionModule> {
    if let Some(dir) = &core.data_dir {
        std::fs::create_dir_all(dir)?;
    }
    let sqlite_path = core.resolve_sqlite_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("SQL store at {}", sqlite_path.display());

    let module = SessionModule::new(
        sql,
        Arc::new(LogMailer::new(config.mail.clone())),
        Arc::new(Argon2Scheme::default()),
        session_config(config),
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize session module: {}", e))?;
    info!(
        token_types = module.service().registry().len(),
        "Session module initialized"
    );
    Ok(module)
}
