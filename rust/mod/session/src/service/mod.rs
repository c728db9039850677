pub mod codec;
pub mod cookie;
pub mod guard;
pub mod mailer;
pub mod password;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod store;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use keygate_sql::{SQLError, SQLStore};

use crate::model::TokenNames;
use crate::service::codec::TokenCodec;
use crate::service::cookie::RefreshCookie;
use crate::service::guard::SessionGuard;
use crate::service::mailer::Mailer;
use crate::service::password::PasswordScheme;
use crate::service::registry::TokenTypeRegistry;
use crate::service::store::SessionStore;

/// Why a credential was rejected. Internal only: never rendered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureReason {
    MissingCredential,
    MalformedCredential,
    AmbiguousCredential,
    UnknownTokenType,
    MalformedToken,
    BadSignature,
    Expired,
    WrongPurpose,
    UnknownSubject,
    StaleRefreshIndex,
    SubjectMismatch,
    AlreadyConfirmed,
}

/// A rejected credential.
///
/// Every cause renders as the same "not authorized" text; the cause is
/// only reachable through [`AuthFailure::reason`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthFailure {
    reason: AuthFailureReason,
}

impl AuthFailure {
    pub fn new(reason: AuthFailureReason) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> AuthFailureReason {
        self.reason
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not authorized")
    }
}

impl fmt::Debug for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthFailure({:?})", self.reason)
    }
}

impl From<AuthFailureReason> for AuthFailure {
    fn from(reason: AuthFailureReason) -> Self {
        Self::new(reason)
    }
}

/// Why a login was rejected. Internal only, like [`AuthFailureReason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownAccount,
    WrongPassword,
    NotConfirmed,
}

/// Session service error type.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(AuthFailure),

    #[error("invalid credentials")]
    InvalidCredentials(CredentialFailure),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn unauthorized(reason: AuthFailureReason) -> Self {
        SessionError::Unauthorized(AuthFailure::new(reason))
    }
}

impl From<AuthFailure> for SessionError {
    fn from(f: AuthFailure) -> Self {
        SessionError::Unauthorized(f)
    }
}

impl From<SQLError> for SessionError {
    fn from(e: SQLError) -> Self {
        SessionError::Storage(e.to_string())
    }
}

impl From<SessionError> for keygate_core::ServiceError {
    fn from(e: SessionError) -> Self {
        use keygate_core::ServiceError;
        match e {
            SessionError::Validation(m) => ServiceError::Validation(m),
            SessionError::NotFound(m) => ServiceError::NotFound(m),
            SessionError::Unauthorized(f) => {
                debug!(reason = ?f.reason(), "request not authorized");
                ServiceError::Unauthorized("not authorized".into())
            }
            SessionError::InvalidCredentials(c) => {
                debug!(reason = ?c, "login rejected");
                ServiceError::Unauthorized("invalid credentials".into())
            }
            SessionError::Conflict(m) => ServiceError::Conflict(m),
            SessionError::Storage(m) | SessionError::Internal(m) => {
                error!(detail = %m, "session operation failed");
                ServiceError::Internal("internal error".into())
            }
        }
    }
}

/// Configuration for the session service.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Registry names for each token purpose.
    pub token_names: TokenNames,
    /// Refresh cookie contract.
    pub cookie: RefreshCookie,
    /// Return emailed tokens in HTTP responses too. Development only.
    pub expose_email_tokens: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            issuer: "keygate".to_string(),
            token_names: TokenNames::default(),
            cookie: RefreshCookie::default(),
            expose_email_tokens: false,
        }
    }
}

/// The session service: token registry, codec and guard wired to account
/// storage and mail.
pub struct SessionService {
    pub(crate) store: SessionStore,
    pub(crate) registry: Arc<TokenTypeRegistry>,
    pub(crate) codec: TokenCodec,
    pub(crate) guard: SessionGuard,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) passwords: Arc<dyn PasswordScheme>,
    pub(crate) config: SessionConfig,
    /// Verified against on unknown-email logins so both paths cost a hash.
    pub(crate) dummy_hash: String,
}

impl SessionService {
    /// Create a SessionService, initializing the DB schema.
    ///
    /// The token type registry starts empty; call
    /// [`SessionService::load_token_types`] before serving traffic.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        mailer: Arc<dyn Mailer>,
        passwords: Arc<dyn PasswordScheme>,
        config: SessionConfig,
    ) -> Result<Arc<Self>, SessionError> {
        schema::init_schema(sql.as_ref())?;

        let registry = Arc::new(TokenTypeRegistry::new());
        let codec = TokenCodec::new(config.issuer.clone(), Arc::clone(&registry));
        let guard = SessionGuard::new(
            codec.clone(),
            config.token_names.clone(),
            config.cookie.name.clone(),
        );
        let dummy_hash = passwords
            .hash("keygate-timing-equalizer")
            .map_err(SessionError::Internal)?;

        Ok(Arc::new(Self {
            store: SessionStore::new(sql),
            registry,
            codec,
            guard,
            mailer,
            passwords,
            config,
            dummy_hash,
        }))
    }

    /// Insert the default token types if the table is empty.
    pub fn seed_token_types(&self) -> Result<usize, SessionError> {
        schema::seed_token_types(&self.store, &self.config.token_names)
    }

    /// Load the token type registry. Idempotent.
    pub fn load_token_types(&self) -> Result<usize, SessionError> {
        self.registry.load(&self.store)
    }

    pub fn registry(&self) -> &TokenTypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
