use tracing::{info, warn};

use crate::model::{
    ChangePasswordRequest, Claims, ConfirmRequest, IssuedSession, LoginRequest, Profile,
    RegisterRequest, Registration, ResetPasswordRequest, TokenPurpose, UserAccount,
};
use crate::service::codec::CodecError;
use crate::service::{AuthFailureReason, CredentialFailure, SessionError, SessionService};

const MAX_EMAIL_LEN: usize = 254;

/// Trim and lowercase an email address, rejecting obvious garbage.
pub fn normalize_email(raw: &str) -> Result<String, SessionError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(SessionError::Validation("email is required".into()));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(SessionError::Validation("email is too long".into()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(SessionError::Validation("email is not valid".into())),
    }
}

fn check_new_password(password: &str, confirmation: &str) -> Result<(), SessionError> {
    if password.is_empty() {
        return Err(SessionError::Validation("password is required".into()));
    }
    if password != confirmation {
        return Err(SessionError::Validation("passwords do not match".into()));
    }
    Ok(())
}

impl SessionService {
    // ── Registration and confirmation ──

    /// Create an unconfirmed account and mail its confirmation token.
    pub fn register(&self, req: &RegisterRequest) -> Result<Registration, SessionError> {
        check_new_password(&req.password, &req.confirmation)?;
        let email = normalize_email(&req.email)?;

        if self.store.get_account_by_email(&email)?.is_some() {
            return Err(SessionError::Conflict("email already registered".into()));
        }

        let ukey = keygate_core::new_ukey();
        let confirm_token = self.encode(TokenPurpose::ConfirmEmail, &ukey, 0)?;

        let password_hash = self.passwords.hash(&req.password).map_err(SessionError::Internal)?;
        let now = keygate_core::now_rfc3339();
        let mut account = UserAccount {
            id: 0,
            ukey,
            email,
            password_hash,
            confirmed: false,
            refresh_index: 0,
            created_at: now.clone(),
            updated_at: now,
        };
        account.id = self.store.insert_account(&account)?;

        info!(ukey = %account.ukey, "account registered");
        self.dispatch_confirmation(&account.email, &confirm_token);

        Ok(Registration {
            account,
            confirm_token,
        })
    }

    /// Mail a fresh confirmation token bound to the current refresh index.
    pub fn resend_confirmation(&self, email: &str) -> Result<String, SessionError> {
        let account = self.account_by_email(email)?;
        if account.confirmed {
            return Err(SessionError::unauthorized(AuthFailureReason::AlreadyConfirmed));
        }
        let token =
            self.encode(TokenPurpose::ConfirmEmail, &account.ukey, account.refresh_index)?;
        self.dispatch_confirmation(&account.email, &token);
        Ok(token)
    }

    /// Redeem a confirmation token for the account owning `email`.
    pub fn confirm(&self, req: &ConfirmRequest) -> Result<Profile, SessionError> {
        let claims = self.guard.verify(&req.token, TokenPurpose::ConfirmEmail)?;
        let account = self.bound_account(&claims)?;

        let email = normalize_email(&req.email)
            .map_err(|_| SessionError::unauthorized(AuthFailureReason::SubjectMismatch))?;
        if email != account.email {
            return Err(SessionError::unauthorized(AuthFailureReason::SubjectMismatch));
        }

        if account.confirmed
            || !self.store.mark_confirmed(&account.ukey, &keygate_core::now_rfc3339())?
        {
            return Err(SessionError::Conflict("account already confirmed".into()));
        }

        info!(ukey = %account.ukey, "account confirmed");
        Ok(Profile {
            confirmed: true,
            ..Profile::from(&account)
        })
    }

    // ── Sessions ──

    /// Check credentials and issue an access/refresh pair at the current
    /// refresh index.
    pub fn login(&self, req: &LoginRequest) -> Result<IssuedSession, SessionError> {
        let account = match normalize_email(&req.email) {
            Ok(email) => self.store.get_account_by_email(&email)?,
            Err(_) => None,
        };

        let Some(account) = account else {
            // Same hashing cost as a real account.
            let _ = self.passwords.verify(&req.password, &self.dummy_hash);
            return Err(SessionError::InvalidCredentials(CredentialFailure::UnknownAccount));
        };

        if !self.passwords.verify(&req.password, &account.password_hash) {
            return Err(SessionError::InvalidCredentials(CredentialFailure::WrongPassword));
        }
        if !account.confirmed {
            return Err(SessionError::InvalidCredentials(CredentialFailure::NotConfirmed));
        }

        let session = self.issue_session(&account.ukey, account.refresh_index)?;
        info!(ukey = %account.ukey, rti = account.refresh_index, "login");
        Ok(session)
    }

    /// Redeem a refresh cookie: advance the refresh index by one and issue a
    /// new pair bound to it. Each refresh token works at most once.
    pub fn refresh(&self, cookie_header: Option<&str>) -> Result<IssuedSession, SessionError> {
        let claims = self.guard.verify_refresh_cookie(cookie_header)?;
        let account = self.bound_account(&claims)?;

        let now = keygate_core::now_rfc3339();
        if !self.store.advance_refresh_index(&account.ukey, claims.rti, &now)? {
            return Err(SessionError::unauthorized(AuthFailureReason::StaleRefreshIndex));
        }

        let rti = claims.rti + 1;
        let session = self.issue_session(&account.ukey, rti)?;
        info!(ukey = %account.ukey, rti, "session refreshed");
        Ok(session)
    }

    /// Verify both session credentials. Nothing is rotated; the caller
    /// clears the cookie.
    pub fn logout(
        &self,
        authorization: Option<&str>,
        cookie_header: Option<&str>,
    ) -> Result<(), SessionError> {
        let access = self.guard.parse_bearer(authorization, TokenPurpose::Access)?;
        let refresh = self.guard.verify_refresh_cookie(cookie_header)?;
        if access.uky != refresh.uky {
            return Err(SessionError::unauthorized(AuthFailureReason::SubjectMismatch));
        }
        self.bound_account(&access)?;
        self.bound_account(&refresh)?;
        info!(ukey = %access.uky, "logout");
        Ok(())
    }

    /// Public view of the bearer's account.
    pub fn profile(&self, authorization: Option<&str>) -> Result<Profile, SessionError> {
        let account = self.authenticate(authorization)?;
        Ok(Profile::from(&account))
    }

    // ── Passwords ──

    /// Mail a reset token bound to the current refresh index.
    pub fn forgot_password(&self, email: &str) -> Result<String, SessionError> {
        let account = self.account_by_email(email)?;
        let token =
            self.encode(TokenPurpose::ResetPassword, &account.ukey, account.refresh_index)?;
        if let Err(e) = self.mailer.send_password_reset(&account.email, &token) {
            warn!(error = %e, "password reset mail not sent");
        }
        Ok(token)
    }

    /// Set a new password with a reset token. The old password is not
    /// consulted.
    pub fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), SessionError> {
        let claims = self.guard.verify(&req.token, TokenPurpose::ResetPassword)?;
        let account = self.bound_account(&claims)?;
        check_new_password(&req.password, &req.confirmation)?;

        self.store_password(&account, &req.password)?;
        info!(ukey = %account.ukey, "password reset");
        Ok(())
    }

    /// Change the bearer's password. The old password must match and differ
    /// from the new one.
    pub fn change_password(
        &self,
        authorization: Option<&str>,
        req: &ChangePasswordRequest,
    ) -> Result<(), SessionError> {
        let account = self.authenticate(authorization)?;
        check_new_password(&req.password, &req.confirmation)?;

        if !self.passwords.verify(&req.old_password, &account.password_hash) {
            return Err(SessionError::InvalidCredentials(CredentialFailure::WrongPassword));
        }
        if req.old_password == req.password {
            return Err(SessionError::Validation(
                "new password must differ from the old one".into(),
            ));
        }

        self.store_password(&account, &req.password)?;
        info!(ukey = %account.ukey, "password changed");
        Ok(())
    }

    // ── Helpers ──

    /// Account behind a verified bearer access token.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<UserAccount, SessionError> {
        let claims = self.guard.parse_bearer(authorization, TokenPurpose::Access)?;
        self.bound_account(&claims)
    }

    /// Account named by `claims`, provided its refresh index still equals
    /// the one the token was issued at.
    fn bound_account(&self, claims: &Claims) -> Result<UserAccount, SessionError> {
        let account = self
            .store
            .get_account_by_ukey(&claims.uky)?
            .ok_or_else(|| SessionError::unauthorized(AuthFailureReason::UnknownSubject))?;
        if account.refresh_index != claims.rti {
            return Err(SessionError::unauthorized(AuthFailureReason::StaleRefreshIndex));
        }
        Ok(account)
    }

    fn account_by_email(&self, email: &str) -> Result<UserAccount, SessionError> {
        let email = normalize_email(email)?;
        self.store
            .get_account_by_email(&email)?
            .ok_or_else(|| SessionError::NotFound("account not found".into()))
    }

    /// Issuing with an unknown type is a server fault, not a client one.
    fn encode(&self, purpose: TokenPurpose, ukey: &str, rti: i64) -> Result<String, SessionError> {
        let name = self.config.token_names.name_for(purpose);
        self.codec.encode(name, ukey, rti).map_err(|e| match e {
            CodecError::UnknownType => {
                SessionError::Internal(format!("token type '{name}' is not loaded"))
            }
            other => other.into(),
        })
    }

    fn issue_session(&self, ukey: &str, rti: i64) -> Result<IssuedSession, SessionError> {
        let names = &self.config.token_names;
        Ok(IssuedSession {
            ukey: ukey.to_string(),
            access_token: self.encode(TokenPurpose::Access, ukey, rti)?,
            refresh_token: self.encode(TokenPurpose::Refresh, ukey, rti)?,
            refresh_index: rti,
            access_expires_in: self.lifetime(&names.access)?,
            refresh_expires_in: self.lifetime(&names.refresh)?,
        })
    }

    fn lifetime(&self, name: &str) -> Result<i64, SessionError> {
        self.codec
            .lifetime_secs(name)
            .map_err(|_| SessionError::Internal(format!("token type '{name}' is not loaded")))
    }

    fn store_password(&self, account: &UserAccount, password: &str) -> Result<(), SessionError> {
        let hash = self.passwords.hash(password).map_err(SessionError::Internal)?;
        self.store
            .set_password_hash(&account.ukey, &hash, &keygate_core::now_rfc3339())
    }

    fn dispatch_confirmation(&self, email: &str, token: &str) {
        if let Err(e) = self.mailer.send_confirmation(email, token) {
            warn!(error = %e, "confirmation mail not sent");
        }
    }
}
