//! Compact array-of-arrays packing of a [`NormalizationEnvelope`], optimized
//! for LLM token count. See spec §3 and §6 ("Wire-min format").

use crate::envelope::{EnvelopeKind, EnvelopePayload, NormalizationEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const WIRE_MIN_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMinPayload {
    pub v: u32,
    pub k: String,
    pub m: Vec<Value>,
    pub d: Vec<Vec<Value>>,
}

/// Pack an envelope into its bit-exact wire-min form, or `None` if the
/// payload is empty (the caller should fall back to the original tool
/// result in that case — spec §4.B.5).
pub fn pack(envelope: &NormalizationEnvelope) -> Option<WireMinPayload> {
    if envelope.payload.is_empty() {
        return None;
    }

    match &envelope.payload {
        EnvelopePayload::Timeseries {
            symbol,
            currency,
            exchange,
            granularity,
            timezone,
            points,
        } => Some(WireMinPayload {
            v: WIRE_MIN_VERSION,
            k: "ts".to_string(),
            m: vec![
                Value::String(symbol.clone()),
                Value::String(currency.clone()),
                Value::String(exchange.clone()),
                Value::String(granularity.clone()),
                Value::String(timezone.clone()),
            ],
            d: points
                .iter()
                .map(|p| {
                    vec![
                        Value::from(p.ts.timestamp()),
                        Value::from(p.open),
                        Value::from(p.high),
                        Value::from(p.low),
                        Value::from(p.close),
                        Value::from(p.volume),
                    ]
                })
                .collect(),
        }),
        EnvelopePayload::Snapshot { quotes } => Some(WireMinPayload {
            v: WIRE_MIN_VERSION,
            k: "q".to_string(),
            m: vec![],
            d: quotes
                .iter()
                .map(|q| {
                    vec![
                        Value::String(q.symbol.clone()),
                        Value::from(q.price),
                        Value::String(q.exchange.clone()),
                        Value::String(q.currency.clone()),
                        Value::from(q.ts.timestamp()),
                    ]
                })
                .collect(),
        }),
        EnvelopePayload::News { articles } => Some(WireMinPayload {
            v: WIRE_MIN_VERSION,
            k: "n".to_string(),
            m: vec![],
            d: articles
                .iter()
                .map(|a| {
                    vec![
                        Value::String(a.source.clone()),
                        Value::String(a.title.clone()),
                        Value::String(a.url.clone()),
                        Value::from(a.published_at.timestamp()),
                    ]
                })
                .collect(),
        }),
    }
}

/// Unpack a wire-min payload back into the envelope's payload half
/// (provider/tool/receipt metadata are not carried on the wire and so
/// cannot be reconstructed — round-trip equality is checked against
/// [`EnvelopePayload`], per spec invariant 5: "modulo field ordering and
/// zero-fills").
pub fn unpack(payload: &WireMinPayload) -> Option<EnvelopePayload> {
    match payload.k.as_str() {
        "ts" => {
            let symbol = payload.m.first()?.as_str()?.to_string();
            let currency = payload.m.get(1)?.as_str()?.to_string();
            let exchange = payload.m.get(2)?.as_str()?.to_string();
            let granularity = payload.m.get(3)?.as_str()?.to_string();
            let timezone = payload.m.get(4)?.as_str()?.to_string();
            let points = payload
                .d
                .iter()
                .filter_map(|row| {
                    let epoch = row.first()?.as_i64()?;
                    let ts = chrono::Utc
                        .timestamp_opt(epoch, 0)
                        .single()
                        .unwrap_or_default();
                    Some(crate::envelope::OhlcvPoint {
                        ts,
                        open: row.get(1)?.as_f64().unwrap_or(0.0),
                        high: row.get(2)?.as_f64().unwrap_or(0.0),
                        low: row.get(3)?.as_f64().unwrap_or(0.0),
                        close: row.get(4)?.as_f64().unwrap_or(0.0),
                        volume: row.get(5)?.as_f64().unwrap_or(0.0),
                    })
                })
                .collect();
            Some(EnvelopePayload::Timeseries {
                symbol,
                currency,
                exchange,
                granularity,
                timezone,
                points,
            })
        }
        "q" => {
            let quotes = payload
                .d
                .iter()
                .filter_map(|row| {
                    Some(crate::envelope::QuoteRow {
                        symbol: row.first()?.as_str()?.to_string(),
                        price: row.get(1)?.as_f64()?,
                        exchange: row.get(2)?.as_str().unwrap_or("").to_string(),
                        currency: row.get(3)?.as_str().unwrap_or("").to_string(),
                        ts: row
                            .get(4)
                            .and_then(serde_json::Value::as_i64)
                            .and_then(|e| chrono::Utc.timestamp_opt(e, 0).single())
                            .unwrap_or_default(),
                    })
                })
                .collect();
            Some(EnvelopePayload::Snapshot { quotes })
        }
        "n" => {
            let articles = payload
                .d
                .iter()
                .filter_map(|row| {
                    Some(crate::envelope::NewsArticle {
                        source: row.first()?.as_str().unwrap_or("").to_string(),
                        title: row.get(1)?.as_str().unwrap_or("").to_string(),
                        url: row.get(2)?.as_str().unwrap_or("").to_string(),
                        published_at: row
                            .get(3)
                            .and_then(serde_json::Value::as_i64)
                            .and_then(|e| chrono::Utc.timestamp_opt(e, 0).single())
                            .unwrap_or_default(),
                    })
                })
                .collect();
            Some(EnvelopePayload::News { articles })
        }
        _ => None,
    }
}

pub fn kind_tag(kind: EnvelopeKind) -> &'static str {
    match kind {
        EnvelopeKind::Timeseries => "ts",
        EnvelopeKind::Snapshot => "q",
        EnvelopeKind::News => "n",
    }
}

use chrono::TimeZone;
