use limitless_engine::{KeyValueStore, MemoryStore};

/// `KeyValueStore` over `window.localStorage`.
/// Falls back to memory when storage is unavailable (private mode, sandboxed iframes).
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
    fallback: MemoryStore,
}

impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; progress will not persist");
        }
        Self {
            storage,
            fallback: MemoryStore::new(),
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        match &self.storage {
            Some(s) => s.get_item(key).ok().flatten(),
            None => self.fallback.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match &self.storage {
            Some(s) => {
                if let Err(err) = s.set_item(key, value) {
                    log::warn!("localStorage write failed for {key}: {err:?}");
                }
            }
            None => self.fallback.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) {
        match &self.storage {
            Some(s) => {
                if let Err(err) = s.remove_item(key) {
                    log::warn!("localStorage remove failed for {key}: {err:?}");
                }
            }
            None => self.fallback.remove(key),
        }
    }
}

/// Seed for the game's RNG, mixed from the clock and `Math.random`.
pub fn entropy_seed() -> u64 {
    let now = js_sys::Date::now() as u64;
    let noise = (js_sys::Math::random() * u32::MAX as f64) as u64;
    now ^ (noise << 21)
}
