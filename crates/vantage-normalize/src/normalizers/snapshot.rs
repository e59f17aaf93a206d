use crate::envelope::{EnvelopePayload, NormalizationEnvelope, QuoteRow, ENVELOPE_SCHEMA_VERSION};
use crate::normalizer::{NormalizeStatus, Normalizer};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Normalizes quote/snapshot responses (e.g. `market_data_quote`). Only rows
/// with a non-null `price` are kept. See spec §4.B.4.
pub struct SnapshotNormalizer;

impl Normalizer for SnapshotNormalizer {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn can(&self, tool_name: &str) -> bool {
        tool_name.contains("quote") || tool_name.contains("snapshot")
    }

    fn normalize(
        &self,
        tool_name: &str,
        provider: &str,
        args: &Value,
        raw_result: &str,
        received_at: DateTime<Utc>,
    ) -> (Option<NormalizationEnvelope>, NormalizeStatus) {
        let parsed: Value = match serde_json::from_str(raw_result) {
            Ok(v) => v,
            Err(e) => {
                return (
                    None,
                    NormalizeStatus::Error {
                        message: format!("invalid JSON: {e}"),
                    },
                )
            }
        };

        let rows = parsed["quotes"].as_array().cloned().unwrap_or_default();
        let mut quotes = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(price) = row["price"].as_f64() else {
                continue;
            };
            quotes.push(QuoteRow {
                symbol: row["symbol"].as_str().unwrap_or("").to_string(),
                price,
                exchange: row["exchange"].as_str().unwrap_or("").to_string(),
                currency: row["currency"].as_str().unwrap_or("USD").to_string(),
                ts: row["ts"]
                    .as_i64()
                    .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
                    .unwrap_or(received_at),
            });
        }

        if quotes.is_empty() {
            return (
                None,
                NormalizeStatus::Empty {
                    reason: "provider_null_series".to_string(),
                },
            );
        }

        let envelope = NormalizationEnvelope {
            schema_version: ENVELOPE_SCHEMA_VERSION,
            provider: provider.to_string(),
            tool_name: tool_name.to_string(),
            received_at,
            metadata: HashMap::new(),
            payload: EnvelopePayload::Snapshot { quotes },
            original_args: args.clone(),
            raw_result: raw_result.to_string(),
        };

        (Some(envelope), NormalizeStatus::Ok)
    }
}
