//! Server-side configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use session::model::TokenNames;
use session::service::cookie::RefreshCookie;
use session::service::mailer::MailLinks;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub token_names: TokenNames,

    #[serde(default)]
    pub cookie: RefreshCookie,

    #[serde(default)]
    pub mail: MailLinks,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for the database.
    #[serde(default)]
    pub data_dir: String,

    /// Explicit SQLite file, overriding `{data_dir}/keygate.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// `iss` claim of every token.
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "keygate".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Echo emailed tokens in responses. Never enable in production.
    #[serde(default)]
    pub expose_email_tokens: bool,
}

impl ServerConfig {
    /// A bare name resolves to `/etc/keygate/<name>.toml`; anything with a
    /// `/` or `.` is used as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/keygate/{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
