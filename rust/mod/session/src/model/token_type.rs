use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit of a token type's `duration` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "d")]
    Days,
    #[serde(rename = "w")]
    Weeks,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "m",
            DurationUnit::Hours => "h",
            DurationUnit::Days => "d",
            DurationUnit::Weeks => "w",
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            DurationUnit::Seconds => 1,
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 3_600,
            DurationUnit::Days => 86_400,
            DurationUnit::Weeks => 604_800,
        }
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(DurationUnit::Seconds),
            "m" => Ok(DurationUnit::Minutes),
            "h" => Ok(DurationUnit::Hours),
            "d" => Ok(DurationUnit::Days),
            "w" => Ok(DurationUnit::Weeks),
            other => Err(format!("unknown duration unit '{other}'")),
        }
    }
}

/// A signing policy for one token purpose, as stored in `token_types`.
///
/// `id` is what travels in the `act` claim; `name` is what configuration
/// refers to. Each row owns its own secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenType {
    pub id: i64,
    pub name: String,
    pub duration: i64,
    pub duration_unit: DurationUnit,
    #[serde(skip_serializing)]
    pub signature: String,
    pub created_at: String,
}

impl TokenType {
    /// Lifetime in seconds, or `None` when it is not positive or overflows.
    pub fn checked_lifetime_secs(&self) -> Option<i64> {
        self.duration
            .checked_mul(self.duration_unit.seconds())
            .filter(|secs| *secs > 0)
    }

    /// Saturating lifetime; rows with an unusable duration never load.
    pub fn lifetime_secs(&self) -> i64 {
        self.duration.saturating_mul(self.duration_unit.seconds())
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("duration_unit", &self.duration_unit)
            .field("signature", &"<redacted>")
            .finish()
    }
}

/// The purposes the account protocol issues and consumes tokens for.
///
/// The registry itself is data-driven; this enum is the closed set of
/// purposes the code acts on, each mapped to a registry name by
/// [`TokenNames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Access,
    Refresh,
    ConfirmEmail,
    ResetPassword,
}

impl TokenPurpose {
    pub const ALL: [TokenPurpose; 4] = [
        TokenPurpose::Access,
        TokenPurpose::Refresh,
        TokenPurpose::ConfirmEmail,
        TokenPurpose::ResetPassword,
    ];

    /// Lifetime given to a freshly seeded token type of this purpose.
    pub fn default_lifetime(&self) -> (i64, DurationUnit) {
        match self {
            TokenPurpose::Access => (15, DurationUnit::Minutes),
            TokenPurpose::Refresh => (7, DurationUnit::Days),
            TokenPurpose::ConfirmEmail => (10, DurationUnit::Minutes),
            TokenPurpose::ResetPassword => (10, DurationUnit::Minutes),
        }
    }
}

/// Registry names bound to each purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenNames {
    pub access: String,
    pub refresh: String,
    pub confirm: String,
    pub reset: String,
}

impl Default for TokenNames {
    fn default() -> Self {
        Self {
            access: "user".to_string(),
            refresh: "refresh".to_string(),
            confirm: "confirm".to_string(),
            reset: "password-reset".to_string(),
        }
    }
}

impl TokenNames {
    pub fn name_for(&self, purpose: TokenPurpose) -> &str {
        match purpose {
            TokenPurpose::Access => &self.access,
            TokenPurpose::Refresh => &self.refresh,
            TokenPurpose::ConfirmEmail => &self.confirm,
            TokenPurpose::ResetPassword => &self.reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_units() {
        for unit in ["s", "m", "h", "d", "w"] {
            let parsed: DurationUnit = unit.parse().unwrap();
            assert_eq!(parsed.as_str(), unit);
        }
        assert!("y".parse::<DurationUnit>().is_err());
        assert!("".parse::<DurationUnit>().is_err());
    }

    #[test]
    fn test_lifetime() {
        let tt = TokenType {
            id: 2,
            name: "refresh".into(),
            duration: 7,
            duration_unit: DurationUnit::Days,
            signature: "s3cret".into(),
            created_at: String::new(),
        };
        assert_eq!(tt.lifetime_secs(), 7 * 86_400);
        assert_eq!(tt.checked_lifetime_secs(), Some(7 * 86_400));

        let zero = TokenType { duration: 0, ..tt.clone() };
        assert_eq!(zero.checked_lifetime_secs(), None);
        let huge = TokenType { duration: i64::MAX / 2, ..tt };
        assert_eq!(huge.checked_lifetime_secs(), None);
        assert_eq!(huge.lifetime_secs(), i64::MAX);
    }

    #[test]
    fn test_debug_redacts_signature() {
        let tt = TokenType {
            id: 1,
            name: "user".into(),
            duration: 15,
            duration_unit: DurationUnit::Minutes,
            signature: "do-not-print".into(),
            created_at: String::new(),
        };
        let out = format!("{tt:?}");
        assert!(!out.contains("do-not-print"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn test_names_cover_every_purpose() {
        let names = TokenNames::default();
        let mut seen: Vec<&str> = TokenPurpose::ALL.iter().map(|p| names.name_for(*p)).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), TokenPurpose::ALL.len());
        assert_eq!(names.name_for(TokenPurpose::ResetPassword), "password-reset");
    }
}
