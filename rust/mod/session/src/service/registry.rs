use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use tracing::{info, warn};

use crate::model::TokenType;
use crate::service::SessionError;
use crate::service::store::SessionStore;

/// Lookup key for a token type: its numeric id (from the `act` claim) or
/// its configured name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTypeKey<'a> {
    Id(i64),
    Name(&'a str),
}

impl From<i64> for TokenTypeKey<'_> {
    fn from(id: i64) -> Self {
        TokenTypeKey::Id(id)
    }
}

impl<'a> From<&'a str> for TokenTypeKey<'a> {
    fn from(name: &'a str) -> Self {
        TokenTypeKey::Name(name)
    }
}

struct Entries {
    by_id: HashMap<i64, TokenType>,
    by_name: HashMap<String, i64>,
}

impl Entries {
    fn build(types: Vec<TokenType>) -> Result<Self, SessionError> {
        let mut by_id = HashMap::with_capacity(types.len());
        let mut by_name = HashMap::with_capacity(types.len());
        for tt in types {
            if by_name.insert(tt.name.clone(), tt.id).is_some() {
                return Err(SessionError::Internal(format!(
                    "duplicate token type name '{}'",
                    tt.name
                )));
            }
            if by_id.contains_key(&tt.id) {
                return Err(SessionError::Internal(format!("duplicate token type id {}", tt.id)));
            }
            by_id.insert(tt.id, tt);
        }
        Ok(Self { by_id, by_name })
    }
}

/// Process-wide table of token types, loaded once from storage.
///
/// Before a successful load every lookup misses. Loading is idempotent and
/// safe to race: one caller reads storage, the rest observe its result. A
/// failed load, or one that finds no rows, leaves the registry unloaded and
/// may be retried.
pub struct TokenTypeRegistry {
    entries: OnceLock<Entries>,
    init: Mutex<()>,
}

impl Default for TokenTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Registry pre-populated from the given types.
    pub fn from_types(types: Vec<TokenType>) -> Result<Self, SessionError> {
        let registry = Self::new();
        registry.install(types)?;
        Ok(registry)
    }

    /// Load every token type from storage. Returns the number loaded.
    pub fn load(&self, store: &SessionStore) -> Result<usize, SessionError> {
        if let Some(e) = self.entries.get() {
            return Ok(e.by_id.len());
        }

        let _guard = self
            .init
            .lock()
            .map_err(|e| SessionError::Internal(format!("registry lock poisoned: {e}")))?;
        if let Some(e) = self.entries.get() {
            return Ok(e.by_id.len());
        }

        let types = store.load_all_token_types()?;
        if types.is_empty() {
            warn!("no token types in storage, registry stays unloaded");
            return Ok(0);
        }
        let n = self.install(types)?;
        info!(count = n, "token type registry loaded");
        Ok(n)
    }

    fn install(&self, types: Vec<TokenType>) -> Result<usize, SessionError> {
        let entries = Entries::build(types)?;
        let n = entries.by_id.len();
        // Only reachable under `init` or on a fresh registry.
        let _ = self.entries.set(entries);
        Ok(n)
    }

    /// Look up a token type by id or name. `None` when unknown or unloaded.
    pub fn resolve<'a>(&self, key: impl Into<TokenTypeKey<'a>>) -> Option<&TokenType> {
        let entries = self.entries.get()?;
        match key.into() {
            TokenTypeKey::Id(id) => entries.by_id.get(&id),
            TokenTypeKey::Name(name) => entries.by_name.get(name).and_then(|id| entries.by_id.get(id)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entries.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.get().map(|e| e.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
