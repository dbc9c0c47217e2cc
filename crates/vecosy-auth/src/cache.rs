use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;
use vecosy_catalog::SnapshotReader;
use vecosy_crypto::VerifyingKey;
use vecosy_types::SemanticVersion;

use crate::error::{AuthError, AuthResult};

/// Path of the public key file inside an application snapshot.
pub const DEFAULT_KEY_PATH: &str = "pub.key";

type CacheKey = (String, String);
type Slot = Arc<OnceCell<Arc<VerifyingKey>>>;

/// Count-bounded cache of application public keys.
///
/// Each `(application, requested version)` owns one slot, inserted before
/// the key is fetched; concurrent misses for the same key wait on the same
/// slot, so the store is read at most once per key while it stays cached.
/// A failed fetch leaves the slot empty and removes it, so the next request
/// retries.
pub struct KeyCache {
    slots: Mutex<LruCache<CacheKey, Slot>>,
    reader: Arc<dyn SnapshotReader>,
    key_path: String,
}

impl KeyCache {
    pub fn new(reader: Arc<dyn SnapshotReader>, capacity: NonZeroUsize) -> Self {
        Self::with_key_path(reader, capacity, DEFAULT_KEY_PATH)
    }

    pub fn with_key_path(
        reader: Arc<dyn SnapshotReader>,
        capacity: NonZeroUsize,
        key_path: impl Into<String>,
    ) -> Self {
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
            reader,
            key_path: key_path.into(),
        }
    }

    /// The public key for `(app, version)`, fetching it on a miss.
    pub async fn get_or_fetch(
        &self,
        app: &str,
        version: &SemanticVersion,
    ) -> AuthResult<Arc<VerifyingKey>> {
        let key: CacheKey = (app.to_string(), version.to_string());
        let slot = {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    let slot: Slot = Arc::new(OnceCell::new());
                    slots.put(key.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        let result = slot
            .get_or_try_init(|| self.fetch(app, version))
            .await
            .map(Arc::clone);

        if result.is_err() {
            let mut slots = self.slots.lock();
            let stale = slots
                .peek(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized());
            if stale {
                slots.pop(&key);
            }
        }
        result
    }

    /// Drop every cached key of `app`.
    pub fn invalidate_app(&self, app: &str) -> usize {
        let mut slots = self.slots.lock();
        let keys: Vec<CacheKey> = slots
            .iter()
            .filter(|((name, _), _)| name == app)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            slots.pop(key);
        }
        if !keys.is_empty() {
            debug!(app, evicted = keys.len(), "invalidated cached public keys");
        }
        keys.len()
    }

    /// Number of slots currently held, including in-flight fetches.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn fetch(&self, app: &str, version: &SemanticVersion) -> AuthResult<Arc<VerifyingKey>> {
        debug!(app, version = %version, path = %self.key_path, "loading public key");
        let file = self.reader.read_file(app, version, &self.key_path).await?;
        let key = VerifyingKey::parse(&file.content).map_err(|e| AuthError::InvalidPublicKey {
            app: app.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Arc::new(key))
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("KeyCache")
            .field("len", &slots.len())
            .field("capacity", &slots.cap())
            .field("key_path", &self.key_path)
            .finish()
    }
}
