//! Date/time utilities for riggs-feed.
//!
//! Feed timestamps are RFC 2822 strings, always rendered in UTC with a
//! literal `+0000` offset (e.g. `Wed, 05 Jun 2024 14:23:01 +0000`).

use chrono::{DateTime, Utc};

use crate::{FeedError, Result};

/// strftime pattern for feed timestamps.
pub const RFC2822_UTC_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Format a UTC datetime as an RFC 2822 feed timestamp.
pub fn format_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.format(RFC2822_UTC_FORMAT).to_string()
}

/// Current time as an RFC 2822 feed timestamp.
pub fn now_rfc2822() -> String {
    format_rfc2822(&Utc::now())
}

/// Normalize a caller-supplied RFC 2822 timestamp to UTC.
///
/// Any offset is accepted on input; the output always carries `+0000`.
///
/// # Errors
///
/// Returns [`FeedError::Usage`] if the string is not RFC 2822.
pub fn normalize_rfc2822(s: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc2822(s.trim())
        .map_err(|e| FeedError::Usage(format!("invalid RFC 2822 timestamp {s:?}: {e}")))?;
    Ok(format_rfc2822(&parsed.with_timezone(&Utc)))
}
