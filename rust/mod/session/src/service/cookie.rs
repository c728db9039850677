use serde::{Deserialize, Serialize};

/// Attributes of the refresh token cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshCookie {
    pub name: String,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for RefreshCookie {
    fn default() -> Self {
        Self {
            name: "refresh_token".to_string(),
            domain: None,
            path: "/".to_string(),
            secure: true,
            http_only: true,
        }
    }
}

impl RefreshCookie {
    /// `Set-Cookie` value carrying `token` for `max_age` seconds.
    ///
    /// `Expires` is left out when the expiry is not a representable date;
    /// `Max-Age` alone still bounds the cookie.
    pub fn issue(&self, token: &str, max_age: i64) -> String {
        let mut out = format!("{}={}; Max-Age={}", self.name, token, max_age);
        let expires = chrono::Duration::try_seconds(max_age)
            .and_then(|d| chrono::Utc::now().checked_add_signed(d));
        if let Some(expires) = expires {
            out.push_str("; Expires=");
            out.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        self.push_scope(&mut out);
        out
    }

    /// `Set-Cookie` value that removes the cookie.
    pub fn clear(&self) -> String {
        let mut out = format!(
            "{}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name
        );
        self.push_scope(&mut out);
        out
    }

    fn push_scope(&self, out: &mut String) {
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        out.push_str("; Path=");
        out.push_str(&self.path);
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str("; SameSite=Strict");
    }
}
