use crate::model::{Claims, TokenNames, TokenPurpose};
use crate::service::codec::TokenCodec;
use crate::service::{AuthFailure, AuthFailureReason};

/// Turns raw request credentials into verified claims.
///
/// Every failure is the same [`AuthFailure`] to the outside; the reason is
/// kept for logs only.
#[derive(Clone)]
pub struct SessionGuard {
    codec: TokenCodec,
    names: TokenNames,
    cookie_name: String,
}

impl SessionGuard {
    pub fn new(codec: TokenCodec, names: TokenNames, cookie_name: impl Into<String>) -> Self {
        Self {
            codec,
            names,
            cookie_name: cookie_name.into(),
        }
    }

    /// Verify a raw token for the given purpose.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, AuthFailure> {
        self.codec
            .verify(token, self.names.name_for(purpose))
            .map_err(|e| {
                AuthFailure::new(e.auth_reason().unwrap_or(AuthFailureReason::MalformedToken))
            })
    }

    /// Verify an `Authorization` header value of the exact shape
    /// `Bearer <token>`.
    pub fn parse_bearer(
        &self,
        header: Option<&str>,
        purpose: TokenPurpose,
    ) -> Result<Claims, AuthFailure> {
        let header = header.ok_or(AuthFailureReason::MissingCredential)?;
        let mut parts = header.split(' ');
        let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) => (scheme, token),
            _ => return Err(AuthFailureReason::MalformedCredential.into()),
        };
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AuthFailureReason::MalformedCredential.into());
        }
        self.verify(token, purpose)
    }

    /// Extract the refresh token from a `Cookie` header value.
    ///
    /// Exactly one cookie with the configured name must be present.
    pub fn parse_refresh_cookie<'h>(&self, header: Option<&'h str>) -> Result<&'h str, AuthFailure> {
        let header = header.ok_or(AuthFailureReason::MissingCredential)?;
        let mut found = None;
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if name.trim() != self.cookie_name {
                continue;
            }
            if found.is_some() {
                return Err(AuthFailureReason::AmbiguousCredential.into());
            }
            found = Some(value.trim());
        }
        match found {
            Some(v) if !v.is_empty() => Ok(v),
            Some(_) => Err(AuthFailureReason::MalformedCredential.into()),
            None => Err(AuthFailureReason::MissingCredential.into()),
        }
    }

    /// Cookie value verified as a refresh token.
    pub fn verify_refresh_cookie(&self, header: Option<&str>) -> Result<Claims, AuthFailure> {
        let token = self.parse_refresh_cookie(header)?;
        self.verify(token, TokenPurpose::Refresh)
    }
}
