use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Schema version stamped on every envelope this crate produces. Bump when
/// the shape of [`EnvelopePayload`] variants changes in a non-additive way.
pub const ENVELOPE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Timeseries,
    Snapshot,
    News,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeseries => "timeseries",
            Self::Snapshot => "snapshot",
            Self::News => "news",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvPoint {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub symbol: String,
    pub price: f64,
    pub exchange: String,
    pub currency: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvelopePayload {
    Timeseries {
        symbol: String,
        currency: String,
        exchange: String,
        granularity: String,
        timezone: String,
        points: Vec<OhlcvPoint>,
    },
    Snapshot { quotes: Vec<QuoteRow> },
    News { articles: Vec<NewsArticle> },
}

impl EnvelopePayload {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Timeseries { .. } => EnvelopeKind::Timeseries,
            Self::Snapshot { .. } => EnvelopeKind::Snapshot,
            Self::News { .. } => EnvelopeKind::News,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Timeseries { points, .. } => points.is_empty(),
            Self::Snapshot { quotes } => quotes.is_empty(),
            Self::News { articles } => articles.is_empty(),
        }
    }
}

/// Provider-agnostic normalized container produced by a [`crate::Normalizer`].
/// See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationEnvelope {
    pub schema_version: u32,
    pub provider: String,
    pub tool_name: String,
    pub received_at: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
    pub payload: EnvelopePayload,
    pub original_args: Value,
    pub raw_result: String,
}

impl NormalizationEnvelope {
    pub fn kind(&self) -> EnvelopeKind {
        self.payload.kind()
    }
}
