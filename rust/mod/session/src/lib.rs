//! Session module: signed session tokens for account flows.
//!
//! # Pieces
//!
//! - **TokenTypeRegistry**: per-purpose signing policies loaded once from storage
//! - **TokenCodec**: HS256 sign/verify with the purpose's own secret
//! - **SessionGuard**: bearer header / refresh cookie to verified claims
//! - **SessionService**: register, confirm, login, refresh, password flows, logout
//!
//! Every token carries the account's refresh index at issuance. Redeeming a
//! refresh token advances the index, which invalidates every older token
//! of the account.
//!
//! # Usage
//!
//! ```ignore
//! use session::{SessionModule, service::SessionConfig};
//!
//! let module = SessionModule::new(sql, mailer, passwords, SessionConfig::default())?;
//! let router = module.routes(); // Mount under /session
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use keygate_core::Module;
use keygate_sql::SQLStore;

use crate::service::mailer::Mailer;
use crate::service::password::PasswordScheme;
use crate::service::{SessionConfig, SessionService};

/// Session module implementing the Module trait.
pub struct SessionModule {
    service: Arc<SessionService>,
}

impl SessionModule {
    /// Create the module, initialize the schema, seed default token types
    /// when none exist and load the registry.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        mailer: Arc<dyn Mailer>,
        passwords: Arc<dyn PasswordScheme>,
        config: SessionConfig,
    ) -> Result<Self, keygate_core::ServiceError> {
        let service = SessionService::new(sql, mailer, passwords, config)?;
        service.seed_token_types()?;
        let loaded = service.load_token_types()?;
        if loaded == 0 {
            return Err(keygate_core::ServiceError::Internal(
                "no token types configured".into(),
            ));
        }
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<SessionService> {
        &self.service
    }
}

impl Module for SessionModule {
    fn name(&self) -> &str {
        "session"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
