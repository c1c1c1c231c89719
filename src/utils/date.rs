// Date handling for lead timestamps, board filters and follow-up scheduling

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

const DAY_MS: i64 = 86_400_000;

/// Naive formats the backend has been seen to emit (interpreted as local time)
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn local_to_fixed(naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Parse a timestamp as sent by the lead service.
///
/// Accepts RFC 3339, naive date-times (local time) and bare `YYYY-MM-DD`
/// dates (local midnight). Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return local_to_fixed(&naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| local_to_fixed(&naive))
}

/// Serde helper for optional backend timestamps.
/// Null, empty and unparseable values all decode to `None`.
pub fn deserialize_opt_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse a date expression used by board filters (`--from`, `--to`)
pub fn parse_date_expr(expr: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match expr.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        "yesterday" => Ok(today - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD, today, tomorrow or yesterday.", expr)),
    }
}

/// Parse a follow-up expression into a local timestamp.
///
/// Supported forms: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`, `today`, `tomorrow`
/// and relative offsets such as `+3d` (from now).
pub fn parse_datetime_expr(expr: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = expr.trim();

    if let Some(days) = trimmed.strip_prefix('+').and_then(|rest| rest.strip_suffix('d')) {
        let days: i64 = days.parse()
            .with_context(|| format!("Invalid relative offset '{}'. Use +Nd, e.g. +3d.", expr))?;
        return Duration::try_days(days)
            .and_then(|offset| Local::now().checked_add_signed(offset))
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| anyhow::anyhow!("Relative offset '{}' is out of range", expr));
    }

    match trimmed.to_lowercase().as_str() {
        "today" | "tomorrow" => {
            let offset = if trimmed.eq_ignore_ascii_case("tomorrow") { 1 } else { 0 };
            let date = Local::now().date_naive() + Duration::days(offset);
            date.and_hms_opt(0, 0, 0)
                .and_then(|naive| local_to_fixed(&naive))
                .ok_or_else(|| anyhow::anyhow!("Ambiguous local date '{}'", expr))
        }
        _ => parse_timestamp(trimmed).ok_or_else(|| {
            anyhow::anyhow!("Invalid date/time '{}'. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM, today, tomorrow or +Nd.", expr)
        }),
    }
}

/// Whole days from `now` until `target`, rounded up.
///
/// Anything later today (or earlier within the last 24h) counts as 0, so a
/// follow-up a few hours overdue still reads as "today".
pub fn days_until<Tz1: TimeZone, Tz2: TimeZone>(target: &DateTime<Tz1>, now: &DateTime<Tz2>) -> i64 {
    let diff_ms = target.timestamp_millis() - now.timestamp_millis();
    let days = diff_ms.div_euclid(DAY_MS);
    if diff_ms.rem_euclid(DAY_MS) != 0 {
        days + 1
    } else {
        days
    }
}

/// Format a timestamp for cards: `17-Oct 2026 14:05` in local time
pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Local).format("%-d-%b %Y %H:%M").to_string()
}
