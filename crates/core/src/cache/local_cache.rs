//! Synchronous key/value cache contract.

use std::collections::HashMap;
use std::sync::Mutex;

/// Durable key→string storage surviving process restarts.
///
/// Implementations must never block on network I/O and must swallow their own
/// storage failures; a failed read simply yields `None`.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory cache. Not durable; used in tests and as a fallback when no
/// storage backend is configured.
#[derive(Debug, Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("cache lock").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), value.to_string());
    }
}
