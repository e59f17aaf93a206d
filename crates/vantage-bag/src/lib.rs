//! The shared typed state store ("bag") every component of the orchestrator
//! reads and writes. See spec §3 and §4.A.
//!
//! Values are stored as [`serde_json::Value`] behind an [`Arc`] so that
//! `snapshot()` is a cheap refcount bump rather than a deep copy, while still
//! giving callers an immutable view: once a value is placed under a key, it
//! is never mutated in place — `set`/`update` always construct and store a
//! brand new `Arc`, so a previously taken snapshot keeps pointing at the old
//! value.

mod keys;
mod types;

pub use keys::Key;
pub use types::{InvestorProfile, Portfolio};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Thread-safe typed key/value store. See spec §4.A.
///
/// All operations are infallible at the type level — malformed reads return
/// `None`/`false` rather than erroring. The one panicking operation,
/// [`SharedBag::must_get`], is deliberately a programming-error trap: calling
/// it on an absent key means the caller believed an invariant that didn't
/// hold.
#[derive(Default)]
pub struct SharedBag {
    entries: Mutex<HashMap<String, Arc<Value>>>,
}

impl SharedBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a raw JSON value. Returns `(value, false)` for absent keys, never
    /// an error — see spec §4.A failure model.
    pub fn get(&self, key: Key) -> (Value, bool) {
        let entries = self.entries.lock().expect("shared bag mutex poisoned");
        match entries.get(key.as_str()) {
            Some(v) => ((**v).clone(), true),
            None => (Value::Null, false),
        }
    }

    /// Read a key that the caller asserts must be present. Aborts the
    /// process on an absent key — reserved for invariants the orchestrator
    /// itself establishes (e.g. a result key it just validated).
    pub fn must_get(&self, key: Key) -> Value {
        let (value, present) = self.get(key);
        assert!(present, "shared bag: required key '{}' is absent", key.as_str());
        value
    }

    /// Best-effort typed extraction. `false` on a missing key or a type
    /// mismatch — never panics, never propagates a deserialize error.
    pub fn get_as<T: DeserializeOwned>(&self, key: Key) -> Option<T> {
        let (value, present) = self.get(key);
        if !present {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Unconditional replace.
    pub fn set<T: Serialize>(&self, key: Key, value: &T) {
        let encoded = serde_json::to_value(value).unwrap_or(Value::Null);
        let mut entries = self.entries.lock().expect("shared bag mutex poisoned");
        entries.insert(key.as_str().to_string(), Arc::new(encoded));
        trace!(key = key.as_str(), "bag.set");
    }

    /// Atomic read-modify-write. `f` observes the value that will be
    /// replaced (or `{}` if the key is absent) and its return value becomes
    /// the new stored value. No other writer observes an intermediate state:
    /// the whole operation holds the bag's single mutex.
    pub fn update(&self, key: Key, f: impl FnOnce(Value) -> Value) {
        let mut entries = self.entries.lock().expect("shared bag mutex poisoned");
        let current = entries
            .get(key.as_str())
            .map(|v| (**v).clone())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let next = f(current);
        entries.insert(key.as_str().to_string(), Arc::new(next));
        trace!(key = key.as_str(), "bag.update");
    }

    /// Typed convenience wrapper over [`SharedBag::update`]: deserializes the
    /// current value (or `T::default()` if absent/unparseable), lets `f`
    /// mutate it in place, and re-serializes.
    pub fn update_typed<T>(&self, key: Key, f: impl FnOnce(&mut T))
    where
        T: Serialize + DeserializeOwned + Default,
    {
        self.update(key, |current| {
            let mut typed: T = serde_json::from_value(current).unwrap_or_default();
            f(&mut typed);
            serde_json::to_value(typed).unwrap_or(Value::Null)
        });
    }

    pub fn has(&self, key: Key) -> bool {
        let entries = self.entries.lock().expect("shared bag mutex poisoned");
        entries.contains_key(key.as_str())
    }

    /// Typed accessor over [`Key::PORTFOLIO`] (spec §2: "typed accessors...
    /// while the common ones get compile-time-checked constants").
    pub fn portfolio(&self) -> Option<Portfolio> {
        self.get_as(Key::PORTFOLIO)
    }

    pub fn set_portfolio(&self, portfolio: &Portfolio) {
        self.set(Key::PORTFOLIO, portfolio);
    }

    /// Typed accessor over [`Key::PROFILE`].
    pub fn profile(&self) -> Option<InvestorProfile> {
        self.get_as(Key::PROFILE)
    }

    pub fn set_profile(&self, profile: &InvestorProfile) {
        self.set(Key::PROFILE, profile);
    }

    /// An immutable, decoupled view of the bag at this instant.
    pub fn snapshot(&self) -> ImmutableBag {
        let entries = self.entries.lock().expect("shared bag mutex poisoned");
        ImmutableBag {
            entries: entries.clone(),
        }
    }

    /// Serialize the whole bag to a single JSON object, `{key: value, ...}`.
    pub fn marshal_json(&self) -> Value {
        let entries = self.entries.lock().expect("shared bag mutex poisoned");
        let map: serde_json::Map<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), (**v).clone()))
            .collect();
        Value::Object(map)
    }
}

/// An immutable snapshot of a [`SharedBag`] at the instant it was taken.
/// Later mutations of the originating bag are never visible through this
/// handle.
#[derive(Clone)]
pub struct ImmutableBag {
    entries: HashMap<String, Arc<Value>>,
}

impl ImmutableBag {
    pub fn get(&self, key: Key) -> (Value, bool) {
        match self.entries.get(key.as_str()) {
            Some(v) => ((**v).clone(), true),
            None => (Value::Null, false),
        }
    }

    pub fn has(&self, key: Key) -> bool {
        self.entries.contains_key(key.as_str())
    }

    pub fn marshal_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), (**v).clone()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests;
