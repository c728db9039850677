use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// One-way password hashing.
pub trait PasswordScheme: Send + Sync {
    /// Hash a plain password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Check a plain password against a stored hash. A hash that cannot be
    /// parsed never matches.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// argon2id in PHC string format.
#[derive(Debug, Clone, Default)]
pub struct Argon2Scheme {
    params: Params,
}

impl Argon2Scheme {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    #[cfg(test)]
    pub(crate) fn fast_for_tests() -> Self {
        match Params::new(8, 1, 1, None) {
            Ok(params) => Self::with_params(params),
            Err(_) => Self::default(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| e.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        // Cost parameters come from the hash itself.
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2().verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}
