use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::model::{Claims, TokenType};
use crate::service::registry::{TokenTypeKey, TokenTypeRegistry};
use crate::service::{AuthFailure, AuthFailureReason, SessionError};

/// Why encoding or verification failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unknown token type")]
    UnknownType,

    #[error("malformed token")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token issued for another purpose")]
    WrongPurpose,

    #[error("signing failed: {0}")]
    Signing(String),
}

impl CodecError {
    /// The authorization failure this error stands for, or `None` for a
    /// server-side signing problem.
    pub(crate) fn auth_reason(&self) -> Option<AuthFailureReason> {
        match self {
            CodecError::UnknownType => Some(AuthFailureReason::UnknownTokenType),
            CodecError::Malformed => Some(AuthFailureReason::MalformedToken),
            CodecError::BadSignature => Some(AuthFailureReason::BadSignature),
            CodecError::Expired => Some(AuthFailureReason::Expired),
            CodecError::WrongPurpose => Some(AuthFailureReason::WrongPurpose),
            CodecError::Signing(_) => None,
        }
    }
}

impl From<CodecError> for SessionError {
    fn from(e: CodecError) -> Self {
        match e.auth_reason() {
            Some(reason) => SessionError::Unauthorized(AuthFailure::new(reason)),
            None => SessionError::Internal(e.to_string()),
        }
    }
}

/// Signs and verifies session tokens with the per-type secret.
///
/// HS256 only. Expiry and issuer are checked by `jsonwebtoken` itself with
/// zero leeway.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    registry: Arc<TokenTypeRegistry>,
}

impl TokenCodec {
    pub fn new(issuer: impl Into<String>, registry: Arc<TokenTypeRegistry>) -> Self {
        Self {
            issuer: issuer.into(),
            registry,
        }
    }

    fn lookup<'a>(&self, key: impl Into<TokenTypeKey<'a>>) -> Result<&TokenType, CodecError> {
        self.registry.resolve(key).ok_or(CodecError::UnknownType)
    }

    /// Sign a token of the given type for `ukey` at refresh index `rti`.
    pub fn encode<'a>(
        &self,
        key: impl Into<TokenTypeKey<'a>>,
        ukey: &str,
        rti: i64,
    ) -> Result<String, CodecError> {
        let tt = self.lookup(key)?;
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            uky: ukey.to_string(),
            act: tt.id,
            rti,
            iat: now,
            exp: now.saturating_add(tt.lifetime_secs()),
        };
        self.sign(tt, &claims)
    }

    pub(crate) fn sign(&self, tt: &TokenType, claims: &Claims) -> Result<String, CodecError> {
        if tt.signature.is_empty() {
            return Err(CodecError::Signing(format!("token type '{}' has no secret", tt.name)));
        }
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(tt.signature.as_bytes()),
        )
        .map_err(|e| CodecError::Signing(format!("JWT encode failed: {e}")))
    }

    /// Verify a token against the given type's secret and return its claims.
    ///
    /// A token signed for another purpose fails the signature check; the
    /// `act` claim is compared as well.
    pub fn verify<'a>(
        &self,
        token: &str,
        key: impl Into<TokenTypeKey<'a>>,
    ) -> Result<Claims, CodecError> {
        let tt = self.lookup(key)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(tt.signature.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => CodecError::Expired,
            ErrorKind::InvalidSignature => CodecError::BadSignature,
            _ => CodecError::Malformed,
        })?;

        if data.claims.act != tt.id {
            return Err(CodecError::WrongPurpose);
        }
        Ok(data.claims)
    }

    /// Lifetime in seconds of tokens of the given type.
    pub fn lifetime_secs<'a>(&self, key: impl Into<TokenTypeKey<'a>>) -> Result<i64, CodecError> {
        Ok(self.lookup(key)?.lifetime_secs())
    }
}
