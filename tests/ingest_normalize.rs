// tests/ingest_normalize.rs
use chrono::{TimeZone, Utc};
use intel_radar::ingest::normalize::normalize;
use intel_radar::ingest::types::{RawItem, RawSource};
use intel_radar::ValidationError;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

#[test]
fn missing_url_or_title_is_a_validation_error() {
    let no_url = RawItem {
        title: Some("Title".into()),
        ..RawItem::default()
    };
    assert_eq!(
        normalize(&no_url, "perigon", now()),
        Err(ValidationError::MissingUrl)
    );

    let no_title = RawItem {
        url: Some("https://news.test/1".into()),
        ..RawItem::default()
    };
    assert_eq!(
        normalize(&no_title, "perigon", now()),
        Err(ValidationError::MissingTitle)
    );

    // Markup-only title cleans down to nothing.
    let blank_title = RawItem::new("https://news.test/2", "  <br/>  ");
    assert_eq!(
        normalize(&blank_title, "perigon", now()),
        Err(ValidationError::MissingTitle)
    );
}

#[test]
fn missing_or_garbled_timestamp_defaults_to_now() {
    let absent = RawItem::new("https://news.test/a", "A");
    let garbled = RawItem {
        published_at: Some("last tuesday".into()),
        ..RawItem::new("https://news.test/b", "B")
    };
    for raw in [absent, garbled] {
        let item = normalize(&raw, "perigon", now()).expect("still valid");
        assert_eq!(item.published_at, now());
    }
}

#[test]
fn defaults_and_cleanup_apply() {
    let raw = RawItem {
        source: None,
        summary: None,
        ..RawItem::new("  https://news.test/c  ", "Zouk&nbsp;<i>reopens</i>")
    };
    let item = normalize(&raw, "fallback-feed", now()).unwrap();
    assert_eq!(item.url, "https://news.test/c");
    assert_eq!(item.title, "Zouk reopens");
    assert_eq!(item.source, "fallback-feed");
    assert_eq!(item.summary, "");
}

#[test]
fn provider_source_and_timestamp_are_kept() {
    let raw = RawItem {
        source: Some(RawSource::Object {
            name: None,
            domain: Some("reviewjournal.com".into()),
        }),
        published_at: Some("2025-05-30T21:15:00Z".into()),
        summary: Some("Lineup announced".into()),
        ..RawItem::new("https://news.test/d", "Marquee lineup")
    };
    let item = normalize(&raw, "perigon", now()).unwrap();
    assert_eq!(item.source, "reviewjournal.com");
    assert_eq!(
        item.published_at,
        Utc.with_ymd_and_hms(2025, 5, 30, 21, 15, 0).unwrap()
    );
    assert_eq!(item.summary, "Lineup announced");
}

#[test]
fn normalize_is_deterministic_for_fixed_now() {
    let raw = RawItem::new("https://news.test/e", "E");
    assert_eq!(
        normalize(&raw, "perigon", now()),
        normalize(&raw, "perigon", now())
    );
}
