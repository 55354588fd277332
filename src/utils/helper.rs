use chrono::{NaiveDate, Utc};

/// Get current timestamp in milliseconds since epoch
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Calendar date used for ledger entries, deals and links.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Strip the leading `@` from a handle, as used in referral query strings.
pub fn bare_username(username: &str) -> &str {
    let trimmed = username.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed)
}
