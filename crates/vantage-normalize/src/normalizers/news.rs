use crate::envelope::{EnvelopePayload, NewsArticle, NormalizationEnvelope, ENVELOPE_SCHEMA_VERSION};
use crate::normalizer::{NormalizeStatus, Normalizer};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Normalizes news search responses. `published_at` is parsed as RFC3339;
/// on parse failure the article still survives, stamped with the decorator's
/// receipt time instead (spec §4.B.4).
pub struct NewsNormalizer;

impl Normalizer for NewsNormalizer {
    fn name(&self) -> &str {
        "news"
    }

    fn can(&self, tool_name: &str) -> bool {
        tool_name.contains("news")
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

        let rows = parsed["articles"].as_array().cloned().unwrap_or_default();
        let articles: Vec<NewsArticle> = rows
            .iter()
            .map(|row| {
                let published_at = row["published_at"]
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(received_at);
                NewsArticle {
                    source: row["source"].as_str().unwrap_or("").to_string(),
                    title: row["title"].as_str().unwrap_or("").to_string(),
                    url: row["url"].as_str().unwrap_or("").to_string(),
                    published_at,
                }
            })
            .collect();

        if articles.is_empty() {
            return (
                None,
                NormalizeStatus::Empty {
                    reason: "no_articles".to_string(),
                },
            );
        }

        let envelope = NormalizationEnvelope {
            schema_version: ENVELOPE_SCHEMA_VERSION,
            provider: provider.to_string(),
            tool_name: tool_name.to_string(),
            received_at,
            metadata: HashMap::new(),
            payload: EnvelopePayload::News { articles },
            original_args: args.clone(),
            raw_result: raw_result.to_string(),
        };

        (Some(envelope), NormalizeStatus::Ok)
    }
}
