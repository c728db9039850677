use serde::{Deserialize, Serialize};

/// Credential and session state of one account (`users` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Internal row id, never exposed.
    #[serde(skip_serializing)]
    pub id: i64,

    /// Public opaque identifier.
    pub ukey: String,

    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Flips to true exactly once.
    pub confirmed: bool,

    /// Bumped by one on every refresh redemption; tokens carry a snapshot.
    pub refresh_index: i64,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub ukey: String,
    pub email: String,
    pub confirmed: bool,
}

impl From<&UserAccount> for Profile {
    fn from(a: &UserAccount) -> Self {
        Self {
            ukey: a.ukey.clone(),
            email: a.email.clone(),
            confirmed: a.confirmed,
        }
    }
}

/// Outcome of a registration: the new account and the confirmation token
/// that was mailed for it.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: UserAccount,
    pub confirm_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub password: String,
    pub confirmation: String,
}
