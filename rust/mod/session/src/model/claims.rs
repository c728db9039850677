use serde::{Deserialize, Serialize};

/// Payload signed into every session token.
///
/// Only meaningful after verification against the token type whose id
/// equals `act`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, static per process.
    pub iss: String,

    /// Subject account's public key.
    pub uky: String,

    /// Token type id this token was issued for.
    pub act: i64,

    /// Subject's refresh index at issuance.
    pub rti: i64,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Tokens handed out by login and refresh.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub ukey: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Refresh index both tokens are bound to.
    pub refresh_index: i64,
    /// Access token lifetime in seconds.
    pub access_expires_in: i64,
    /// Refresh token (and cookie) lifetime in seconds.
    pub refresh_expires_in: i64,
}

/// Response body for login and refresh. The refresh token travels only in
/// the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub ukey: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<&IssuedSession> for TokenResponse {
    fn from(s: &IssuedSession) -> Self {
        Self {
            ukey: s.ukey.clone(),
            access_token: s.access_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: s.access_expires_in,
        }
    }
}
