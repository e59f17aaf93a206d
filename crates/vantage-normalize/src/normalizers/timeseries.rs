use crate::envelope::{EnvelopePayload, NormalizationEnvelope, OhlcvPoint, ENVELOPE_SCHEMA_VERSION};
use crate::normalizer::{NormalizeStatus, Normalizer};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Normalizes OHLCV timeseries responses (e.g. `market_data_timeseries`,
/// any tool name containing "timeseries" or "ohlcv"). Points are sorted
/// ascending by timestamp, UTC; rows where every field is null are skipped;
/// parallel arrays are clamped to the shortest column's length; missing
/// scalars become zero. See spec §4.B.4.
pub struct TimeseriesNormalizer;

impl Normalizer for TimeseriesNormalizer {
    fn name(&self) -> &str {
        "timeseries"
    }

    fn can(&self, tool_name: &str) -> bool {
        tool_name.contains("timeseries") || tool_name.contains("ohlcv")
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

        let symbol = parsed["symbol"].as_str().unwrap_or("").to_string();
        let currency = parsed["currency"].as_str().unwrap_or("USD").to_string();
        let exchange = parsed["exchange"].as_str().unwrap_or("").to_string();
        let granularity = parsed["granularity"].as_str().unwrap_or("1d").to_string();
        let timezone = parsed["timezone"].as_str().unwrap_or("UTC").to_string();

        let ts_col = array_col(&parsed, "timestamps");
        let open_col = array_col(&parsed, "open");
        let high_col = array_col(&parsed, "high");
        let low_col = array_col(&parsed, "low");
        let close_col = array_col(&parsed, "close");
        let volume_col = array_col(&parsed, "volume");

        let min_len = [
            ts_col.len(),
            open_col.len(),
            high_col.len(),
            low_col.len(),
            close_col.len(),
            volume_col.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);

        let mut points: Vec<OhlcvPoint> = Vec::with_capacity(min_len);
        for i in 0..min_len {
            let open = open_col[i].as_f64();
            let high = high_col[i].as_f64();
            let low = low_col[i].as_f64();
            let close = close_col[i].as_f64();
            let volume = volume_col[i].as_f64();

            if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
            {
                continue;
            }

            let ts = ts_col[i]
                .as_i64()
                .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
                .unwrap_or(received_at);

            points.push(OhlcvPoint {
                ts,
                open: open.unwrap_or(0.0),
                high: high.unwrap_or(0.0),
                low: low.unwrap_or(0.0),
                close: close.unwrap_or(0.0),
                volume: volume.unwrap_or(0.0),
            });
        }
        points.sort_by_key(|p| p.ts);

        if points.is_empty() {
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
            payload: EnvelopePayload::Timeseries {
                symbol,
                currency,
                exchange,
                granularity,
                timezone,
                points,
            },
            original_args: args.clone(),
            raw_result: raw_result.to_string(),
        };

        (Some(envelope), NormalizeStatus::Ok)
    }
}

fn array_col<'a>(parsed: &'a Value, field: &str) -> &'a [Value] {
    parsed[field].as_array().map(Vec::as_slice).unwrap_or(&[])
}
