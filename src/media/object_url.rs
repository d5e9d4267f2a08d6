// SPDX-License-Identifier: GPL-3.0-only

//! Scoped display URLs for in-memory images
//!
//! An [`ObjectUrl`] is a `blob:` handle that maps to encoded bytes held in an
//! [`ObjectUrlStore`]. The handle revokes itself when dropped, so whoever owns
//! the handle owns the lifetime of the bytes behind it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:photo-booth/";

#[derive(Clone)]
struct ObjectEntry {
    mime: &'static str,
    data: Arc<[u8]>,
}

/// Registry of live object URLs
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    entries: Arc<Mutex<HashMap<String, ObjectEntry>>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ObjectEntry>> {
        // Every critical section is a single map call
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `data` and hand back the owning handle
    pub fn create(&self, data: Arc<[u8]>, mime: &'static str) -> ObjectUrl {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        self.lock().insert(url.clone(), ObjectEntry { mime, data });
        debug!(%url, mime, "Object URL created");
        ObjectUrl {
            url,
            store: self.clone(),
        }
    }

    /// Look up the bytes behind a live URL
    pub fn resolve(&self, url: &str) -> Option<(Arc<[u8]>, &'static str)> {
        self.lock()
            .get(url)
            .map(|entry| (entry.data.clone(), entry.mime))
    }

    /// Number of URLs not yet revoked
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_some() {
            debug!(%url, "Object URL revoked");
        }
    }
}

impl std::fmt::Debug for ObjectUrlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectUrlStore({} live)", self.live_count())
    }
}

/// Owning handle to a registered URL; revoked on drop
pub struct ObjectUrl {
    url: String,
    store: ObjectUrlStore,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectUrl({})", self.url)
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
