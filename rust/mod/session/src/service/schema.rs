use rand::Rng;
use tracing::info;

use keygate_sql::SQLStore;

use crate::model::{TokenNames, TokenPurpose};
use crate::service::store::SessionStore;
use crate::service::SessionError;

/// Initialize the SQLite schema for token types and accounts.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), SessionError> {
    let statements = [
        // Token types: one signing policy per purpose
        "CREATE TABLE IF NOT EXISTS token_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            duration INTEGER NOT NULL,
            duration_unit TEXT NOT NULL DEFAULT 'm',
            signature TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",

        // Users: credential and session state
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ukey TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            confirmed INTEGER NOT NULL DEFAULT 0,
            refresh_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}

/// Insert one token type per purpose when the table is empty.
///
/// Each gets a fresh 256-bit hex secret. Returns how many rows were added.
pub fn seed_token_types(store: &SessionStore, names: &TokenNames) -> Result<usize, SessionError> {
    if store.count_token_types()? > 0 {
        return Ok(0);
    }

    let now = keygate_core::now_rfc3339();
    for purpose in TokenPurpose::ALL {
        let (duration, unit) = purpose.default_lifetime();
        store.insert_token_type(names.name_for(purpose), duration, unit, &generate_secret(), &now)?;
    }

    info!(count = TokenPurpose::ALL.len(), "seeded default token types");
    Ok(TokenPurpose::ALL.len())
}

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32).map(|_| format!("{:02x}", rng.r#gen::<u8>())).collect()
}
