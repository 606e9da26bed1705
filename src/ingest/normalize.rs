// src/ingest/normalize.rs
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::error::ValidationError;
use crate::ingest::types::{NewItem, RawItem};

const MAX_TEXT_CHARS: usize = 1500;
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Clean provider text: decode entities, strip tags, collapse whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Best-effort timestamp parse. `None` means "use ingestion time".
pub fn parse_published_at(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    // Bare integers are unix epochs; large ones are milliseconds.
    if let Ok(n) = ts.parse::<i64>() {
        return if n.abs() >= EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive ISO date-times carry no offset; providers mean UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(naive.and_utc());
        }
    }
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
}

fn validate_url(raw: Option<&str>) -> Result<String, ValidationError> {
    let url = raw
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(ValidationError::MissingUrl)?;
    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(url.to_string())
}

/// Map a raw provider record onto a `NewItem`.
///
/// Pure: `fallback_source` fills a missing source and `now` fills a missing or
/// unparsable publication time.
pub fn normalize(
    raw: &RawItem,
    fallback_source: &str,
    now: DateTime<Utc>,
) -> Result<NewItem, ValidationError> {
    if let Some(reason) = &raw.malformed {
        return Err(ValidationError::Malformed(reason.clone()));
    }
    let url = validate_url(raw.url.as_deref())?;

    let title = raw.title.as_deref().map(clean_text).unwrap_or_default();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }

    let source = raw
        .source
        .as_ref()
        .and_then(|s| s.label())
        .unwrap_or(fallback_source)
        .to_string();

    let summary = raw
        .summary
        .as_deref()
        .or(raw.description.as_deref())
        .map(clean_text)
        .unwrap_or_default();

    let published_at = [raw.published_at.as_deref(), raw.pub_date.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_published_at)
        .unwrap_or(now);

    Ok(NewItem {
        source,
        title,
        url,
        published_at,
        summary,
    })
}
