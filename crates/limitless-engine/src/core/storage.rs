//! Persistent key-value storage and tolerant JSON records.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// String key-value storage. The browser build backs this with `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store, used natively and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Parse a record, keeping the default for every field that is missing or malformed.
///
/// Each stored field is merged over `T::default()` on its own and kept only if the
/// record still deserializes, so one corrupt field never discards its neighbours.
pub fn from_json_lenient<T>(json: &str) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    let defaults = T::default();
    let parsed = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log::warn!("stored record is not an object; using defaults");
            return defaults;
        }
        Err(err) => {
            log::warn!("stored record is not valid JSON ({err}); using defaults");
            return defaults;
        }
    };
    let mut merged = match serde_json::to_value(&defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults,
    };

    let keys: Vec<String> = merged.keys().cloned().collect();
    for key in keys {
        let Some(candidate) = parsed.get(&key) else {
            continue;
        };
        let previous = merged.insert(key.clone(), candidate.clone());
        if !accepts::<T>(&merged) {
            log::warn!("stored field `{key}` is malformed; using default");
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
}

fn accepts<T: DeserializeOwned>(map: &Map<String, Value>) -> bool {
    serde_json::from_value::<T>(Value::Object(map.clone())).is_ok()
}

/// Load a record from the store. Absent keys yield defaults.
pub fn load_lenient<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    match store.get(key) {
        Some(json) => from_json_lenient(&json),
        None => T::default(),
    }
}

/// Serialize a record into the store.
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json);
    Ok(())
}
