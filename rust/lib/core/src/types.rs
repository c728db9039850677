/// Generate a public account key: a hyphenated UUIDv4.
///
/// Account keys are handed to clients and embedded in tokens.
pub fn new_ukey() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
