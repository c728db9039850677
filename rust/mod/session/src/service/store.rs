use std::sync::Arc;

use keygate_sql::{Row, SQLStore, Value};

use crate::model::{DurationUnit, TokenType, UserAccount};
use crate::service::SessionError;

const ACCOUNT_COLUMNS: &str =
    "id, ukey, email, password_hash, confirmed, refresh_index, created_at, updated_at";

/// Typed queries over the `token_types` and `users` tables.
pub struct SessionStore {
    sql: Arc<dyn SQLStore>,
}

impl SessionStore {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }

    // ── Token types ──

    pub fn count_token_types(&self) -> Result<i64, SessionError> {
        let rows = self.sql.query("SELECT COUNT(*) AS n FROM token_types", &[])?;
        Ok(rows.first().and_then(|r| r.get_i64("n")).unwrap_or(0))
    }

    pub fn insert_token_type(
        &self,
        name: &str,
        duration: i64,
        unit: DurationUnit,
        signature: &str,
        created_at: &str,
    ) -> Result<(), SessionError> {
        self.sql
            .exec(
                "INSERT INTO token_types (name, duration, duration_unit, signature, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                &[
                    name.into(),
                    duration.into(),
                    unit.as_str().into(),
                    signature.into(),
                    created_at.into(),
                ],
            )
            .map_err(|e| {
                if e.is_constraint() {
                    SessionError::Conflict(format!("token type '{name}' already exists"))
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Every stored token type. Fails on a row with an unknown duration unit.
    pub fn load_all_token_types(&self) -> Result<Vec<TokenType>, SessionError> {
        let rows = self.sql.query(
            "SELECT id, name, duration, duration_unit, signature, created_at
             FROM token_types ORDER BY id",
            &[],
        )?;
        rows.iter().map(row_to_token_type).collect()
    }

    // ── Accounts ──

    pub fn get_account_by_ukey(&self, ukey: &str) -> Result<Option<UserAccount>, SessionError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE ukey = ?1 AND deleted_at IS NULL"
        );
        let rows = self.sql.query(&sql, &[ukey.into()])?;
        rows.first().map(row_to_account).transpose()
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, SessionError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = ?1 AND deleted_at IS NULL"
        );
        let rows = self.sql.query(&sql, &[email.into()])?;
        rows.first().map(row_to_account).transpose()
    }

    /// Insert a new account. A duplicate email or ukey is a conflict.
    pub fn insert_account(&self, account: &UserAccount) -> Result<i64, SessionError> {
        self.sql
            .exec(
                "INSERT INTO users (ukey, email, password_hash, confirmed, refresh_index, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    account.ukey.as_str().into(),
                    account.email.as_str().into(),
                    account.password_hash.as_str().into(),
                    account.confirmed.into(),
                    account.refresh_index.into(),
                    account.created_at.as_str().into(),
                    account.updated_at.as_str().into(),
                ],
            )
            .map_err(|e| {
                if e.is_constraint() {
                    SessionError::Conflict("email already registered".into())
                } else {
                    e.into()
                }
            })?;

        let rows = self
            .sql
            .query("SELECT id FROM users WHERE ukey = ?1", &[account.ukey.as_str().into()])?;
        rows.first()
            .and_then(|r| r.get_i64("id"))
            .ok_or_else(|| SessionError::Storage("inserted account not readable".into()))
    }

    /// Flip `confirmed` to true. Returns false if it already was.
    pub fn mark_confirmed(&self, ukey: &str, now: &str) -> Result<bool, SessionError> {
        let n = self.sql.exec(
            "UPDATE users SET confirmed = 1, updated_at = ?2
             WHERE ukey = ?1 AND confirmed = 0 AND deleted_at IS NULL",
            &[ukey.into(), now.into()],
        )?;
        Ok(n == 1)
    }

    pub fn set_password_hash(&self, ukey: &str, hash: &str, now: &str) -> Result<(), SessionError> {
        let n = self.sql.exec(
            "UPDATE users SET password_hash = ?2, updated_at = ?3
             WHERE ukey = ?1 AND deleted_at IS NULL",
            &[ukey.into(), hash.into(), now.into()],
        )?;
        if n == 0 {
            return Err(SessionError::NotFound(format!("account {ukey}")));
        }
        Ok(())
    }

    /// Compare-and-set the refresh index from `expected` to `expected + 1`.
    ///
    /// Returns false when the stored index no longer equals `expected`, i.e.
    /// another redemption already won.
    pub fn advance_refresh_index(
        &self,
        ukey: &str,
        expected: i64,
        now: &str,
    ) -> Result<bool, SessionError> {
        let n = self.sql.exec(
            "UPDATE users SET refresh_index = refresh_index + 1, updated_at = ?3
             WHERE ukey = ?1 AND refresh_index = ?2 AND deleted_at IS NULL",
            &[ukey.into(), expected.into(), now.into()],
        )?;
        Ok(n == 1)
    }

    /// Soft-delete an account. Deleted accounts are invisible to every lookup.
    pub fn soft_delete_account(&self, ukey: &str, now: &str) -> Result<bool, SessionError> {
        let n = self.sql.exec(
            "UPDATE users SET deleted_at = ?2 WHERE ukey = ?1 AND deleted_at IS NULL",
            &[ukey.into(), Value::from(now)],
        )?;
        Ok(n == 1)
    }
}

fn required_str(row: &Row, col: &str) -> Result<String, SessionError> {
    row.get_str(col)
        .map(str::to_string)
        .ok_or_else(|| SessionError::Storage(format!("column '{col}' missing or not text")))
}

fn required_i64(row: &Row, col: &str) -> Result<i64, SessionError> {
    row.get_i64(col)
        .ok_or_else(|| SessionError::Storage(format!("column '{col}' missing or not integer")))
}

fn row_to_token_type(row: &Row) -> Result<TokenType, SessionError> {
    let unit = required_str(row, "duration_unit")?;
    let duration_unit: DurationUnit = unit.parse().map_err(SessionError::Storage)?;
    let tt = TokenType {
        id: required_i64(row, "id")?,
        name: required_str(row, "name")?,
        duration: required_i64(row, "duration")?,
        duration_unit,
        signature: required_str(row, "signature")?,
        created_at: required_str(row, "created_at")?,
    };
    if tt.checked_lifetime_secs().is_none() {
        return Err(SessionError::Storage(format!(
            "token type '{}' has unusable duration {}{}",
            tt.name,
            tt.duration,
            tt.duration_unit.as_str()
        )));
    }
    Ok(tt)
}

fn row_to_account(row: &Row) -> Result<UserAccount, SessionError> {
    Ok(UserAccount {
        id: required_i64(row, "id")?,
        ukey: required_str(row, "ukey")?,
        email: required_str(row, "email")?,
        password_hash: required_str(row, "password_hash")?,
        confirmed: row.get_bool("confirmed").unwrap_or(false),
        refresh_index: required_i64(row, "refresh_index")?,
        created_at: required_str(row, "created_at")?,
        updated_at: required_str(row, "updated_at")?,
    })
}
