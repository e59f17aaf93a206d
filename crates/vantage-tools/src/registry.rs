//! Explicit tool-factory registration. Factories are added one at a time by
//! calling code at process start — never discovered via a module `init()` or
//! `inventory`-style side effect (`SPEC_FULL.md` §4, REDESIGN FLAGS).

use crate::config::{ToolConfig, ToolFactory};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use vantage_bag::SharedBag;

#[derive(Default)]
pub struct ToolFactoryRegistry {
    factories: HashMap<String, ToolFactory>,
}

impl ToolFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `key`. Re-registering the same key replaces
    /// the previous factory — callers control load order explicitly, there's
    /// no ambient discovery to race against.
    pub fn register(&mut self, key: impl Into<String>, factory: ToolFactory) -> &mut Self {
        self.factories.insert(key.into(), factory);
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Runs the factory for `key`, producing the [`ToolConfig`] that
    /// [`crate::manager::ToolManager::new`] will wrap and install.
    pub fn build(
        &self,
        key: &str,
        raw_config: &Value,
        bag: Arc<SharedBag>,
    ) -> anyhow::Result<ToolConfig> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("no tool factory registered for key '{key}'"))?;
        factory(raw_config, bag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EchoTool;

    fn echo_factory() -> ToolFactory {
        Box::new(|_raw, _bag| {
            Ok(ToolConfig::new("echo", |_raw, _bag| {
                Ok(Arc::new(EchoTool::new("echo")))
            }))
        })
    }

    #[test]
    fn unregistered_key_is_an_error() {
        let registry = ToolFactoryRegistry::new();
        let bag = Arc::new(SharedBag::new());
        assert!(registry.build("echo", &Value::Null, bag).is_err());
    }

    #[test]
    fn registered_factory_builds_a_config() {
        let mut registry = ToolFactoryRegistry::new();
        registry.register("echo", echo_factory());
        assert!(registry.is_registered("echo"));
        let bag = Arc::new(SharedBag::new());
        let config = registry.build("echo", &Value::Null, bag).unwrap();
        assert_eq!(config.key, "echo");
    }
}
