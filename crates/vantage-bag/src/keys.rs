//! Well-known bag keys (spec §3: "a fixed enumeration of well-known keys
//! exists"). `Key` wraps a `&'static str` rather than an enum so that
//! forward-compatible/engine-specific keys can still be addressed without
//! editing this crate, while the common ones get compile-time-checked
//! constants at every call site.

/// An opaque string identifier addressing a [`crate::SharedBag`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(&'static str);

impl Key {
    /// Address a key not in the well-known set below (engine-specific
    /// results, ad hoc scratch values).
    pub const fn custom(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub const PORTFOLIO: Key = Key("portfolio");
    pub const PROFILE: Key = Key("profile");
    pub const RISK_ANALYSIS_RESULT: Key = Key("risk_analysis_result");
    pub const INVESTMENT_RESEARCH_RESULT: Key = Key("investment_research_result");
    pub const TOOL_COMPUTATIONS: Key = Key("tool_computations");
    pub const TOOL_METRICS: Key = Key("tool_metrics");
    pub const CACHE_STATS: Key = Key("cache_stats");
    pub const EXTERNAL_DATA_HEALTH: Key = Key("external_data_health");
    pub const BATCH_MODE: Key = Key("batch_mode");
    pub const NORMALIZED_TOOL_RESULTS: Key = Key("normalized_tool_results");
    pub const WIREMIN_TOOL_PAYLOADS: Key = Key("wiremin_tool_payloads");
    pub const RATE_LIMIT_STATS: Key = Key("rate_limit_stats");
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
