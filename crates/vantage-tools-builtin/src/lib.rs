//! Concrete tool implementations (market data, news, economic indicators,
//! filings, web search), registered explicitly against a
//! [`vantage_tools::ToolFactoryRegistry`] by [`register_all`] — never via a
//! module-level side effect. See spec §4.C and `SPEC_FULL.md` REDESIGN FLAGS.

mod economic_indicator;
mod market_data_quote;
mod market_data_timeseries;
mod news_search;
mod sec_filings;
mod test_support;
mod web_search;

pub use economic_indicator::FredIndicatorTool;
pub use market_data_quote::FmpQuoteTool;
pub use market_data_timeseries::YFinanceTimeseriesTool;
pub use news_search::NewsApiTool;
pub use sec_filings::SecFilingsTool;
pub use web_search::WebSearchTool;

use std::sync::Arc;
use vantage_tools::{Tool, ToolConfig, ToolFactoryRegistry};

/// Registers a factory for every tool this crate ships. Callers decide which
/// of these keys to actually enable via `ManagerSettings::enabled_tools`.
pub fn register_all(registry: &mut ToolFactoryRegistry) {
    registry.register(
        "market_data_quote",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new("market_data_quote", |raw_config, _bag| {
                let api_key = raw_config["api_key"].as_str().unwrap_or_default().to_string();
                Ok(Arc::new(FmpQuoteTool::new(api_key)) as Arc<dyn Tool>)
            })
            .with_provider("fmp")
            .with_raw_config(raw.clone()))
        }),
    );

    registry.register(
        "market_data_timeseries",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new("market_data_timeseries", |_raw_config, _bag| {
                Ok(Arc::new(YFinanceTimeseriesTool::new()) as Arc<dyn Tool>)
            })
            .with_provider("yfinance")
            .with_raw_config(raw.clone()))
        }),
    );

    registry.register(
        "news_search",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new("news_search", |raw_config, _bag| {
                let api_key = raw_config["api_key"].as_str().unwrap_or_default().to_string();
                Ok(Arc::new(NewsApiTool::new(api_key)) as Arc<dyn Tool>)
            })
            .with_provider("newsapi")
            .with_raw_config(raw.clone()))
        }),
    );

    registry.register(
        "economic_indicator_timeseries",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new(
                "economic_indicator_timeseries",
                |raw_config, _bag| {
                    let api_key = raw_config["api_key"].as_str().unwrap_or_default().to_string();
                    Ok(Arc::new(FredIndicatorTool::new(api_key)) as Arc<dyn Tool>)
                },
            )
            .with_provider("fred")
            .with_raw_config(raw.clone()))
        }),
    );

    registry.register(
        "sec_filings_search",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new("sec_filings_search", |_raw_config, _bag| {
                Ok(Arc::new(SecFilingsTool::new()) as Arc<dyn Tool>)
            })
            .with_provider("sec_edgar")
            .with_raw_config(raw.clone()))
        }),
    );

    registry.register(
        "web_search",
        Box::new(|raw, _bag| {
            Ok(ToolConfig::new("web_search", |raw_config, _bag| {
                let api_key = raw_config["api_key"].as_str().unwrap_or_default().to_string();
                Ok(Arc::new(WebSearchTool::new(api_key)) as Arc<dyn Tool>)
            })
            .with_provider("brave")
            .with_raw_config(raw.clone()))
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use vantage_bag::SharedBag;

    #[test]
    fn registers_every_builtin_tool() {
        let mut registry = ToolFactoryRegistry::new();
        register_all(&mut registry);
        for key in [
            "market_data_quote",
            "market_data_timeseries",
            "news_search",
            "economic_indicator_timeseries",
            "sec_filings_search",
            "web_search",
        ] {
            assert!(registry.is_registered(key), "missing factory for {key}");
            let bag = Arc::new(SharedBag::new());
            let config = registry.build(key, &Value::Null, bag.clone()).unwrap();
            assert_eq!(config.key, key);
            (config.constructor)(&config.raw_config, bag).unwrap();
        }
    }
}
