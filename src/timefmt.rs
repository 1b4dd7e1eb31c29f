use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::error::SyncError;

/// Rendered in place of a timestamp the server never reported.
pub const PLACEHOLDER: &str = "N/A";

pub fn parse_zone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| {
        anyhow!("unrecognized timezone {name:?} (expected an IANA name such as Europe/Madrid)")
    })
}

/// Renders a UTC timestamp in `zone` as `YYYY-MM-DD HH:MM:SS <abbr>`.
///
/// Absent and placeholder values render as [`PLACEHOLDER`] rather than
/// failing. Fractional seconds are dropped before parsing; a trailing `Z` is
/// tolerated.
pub fn localize_utc_timestamp(raw: Option<&str>, zone: Tz) -> Result<String, SyncError> {
    let Some(raw) = raw else {
        return Ok(PLACEHOLDER.to_string());
    };
    let raw = raw.trim();
    if raw.is_empty() || raw == PLACEHOLDER {
        return Ok(PLACEHOLDER.to_string());
    }

    let truncated = raw
        .split('.')
        .next()
        .unwrap_or(raw)
        .trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(truncated, "%Y-%m-%dT%H:%M:%S").map_err(
        |source| SyncError::Timestamp {
            value: raw.to_string(),
            source,
        },
    )?;
    Ok(parsed
        .and_utc()
        .with_timezone(&zone)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string())
}
