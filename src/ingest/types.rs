// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, FetchError};

/// Store-assigned surrogate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub source: String,
    pub title: String,
    pub url: String, // uniqueness key
    pub published_at: DateTime<Utc>,
    pub summary: String,
}

/// A persisted item. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
}

impl Item {
    pub fn from_new(id: ItemId, new: NewItem) -> Self {
        Self {
            id,
            source: new.source,
            title: new.title,
            url: new.url,
            published_at: new.published_at,
            summary: new.summary,
        }
    }
}

/// Provider record as received. Every field is optional; the normalizer decides.
///
/// Decoding never fails on a JSON object: a field of the wrong type reads as
/// absent, so one sloppy record cannot take the rest of the page down with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    #[serde(deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_source")]
    pub source: Option<RawSource>,
    #[serde(deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "publishedAt", deserialize_with = "lenient_timestamp")]
    pub published_at: Option<String>,
    #[serde(rename = "pubDate", deserialize_with = "lenient_timestamp")]
    pub pub_date: Option<String>,
    /// Set when the provider entry could not be read as a record.
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl RawItem {
    /// Minimal record with url + title, handy for fixtures.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Placeholder for an entry that is not a JSON object.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Decode one provider entry. Never fails; see [`RawItem::malformed`].
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::malformed(format!("expected an object, got {value}"));
        }
        serde_json::from_value(value).unwrap_or_else(|e| Self::malformed(e.to_string()))
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// Epoch numbers are kept as their decimal text for the normalizer.
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_source<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RawSource>, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(d)?).ok())
}

/// Providers disagree on the shape of `source`: a bare name or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        domain: Option<String>,
    },
}

impl RawSource {
    pub fn label(&self) -> Option<&str> {
        let s = match self {
            RawSource::Name(n) => Some(n.as_str()),
            RawSource::Object { name, domain } => name.as_deref().or(domain.as_deref()),
        };
        s.map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Query + time window for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub query: String,
    pub from: NaiveDate,
    pub sources: Vec<String>,
    pub page_size: u32,
}

impl FetchRequest {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "page_size",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch a single page. Never retries.
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<RawItem>, FetchError>;

    /// Prerequisite check run before a cycle starts fetching.
    fn ready(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}
