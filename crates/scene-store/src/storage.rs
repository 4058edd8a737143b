//! # Key-Value Storage
//!
//! Persistence for small per-user state (wizard progress, dismissed
//! banners) behind a synchronous string-keyed interface. Scenes receive a
//! [`Storage`] through their deps and usually wrap it in a
//! [`ScopedStorage`] so two scenes can both call their key `"step"`
//! without colliding.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// String-keyed persistence. Implementations must tolerate concurrent
/// callers; values are opaque to the store.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-local [`Storage`], the default for demos and tests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Prefixes every key with a namespace before delegating.
pub struct ScopedStorage {
    namespace: String,
    inner: Arc<dyn Storage>,
}

impl ScopedStorage {
    pub fn new(inner: Arc<dyn Storage>, namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), inner }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }
}

impl Storage for ScopedStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.set(&self.scoped(key), value);
    }

    fn remove(&self, key: &str) {
        self.inner.remove(&self.scoped(key));
    }
}
