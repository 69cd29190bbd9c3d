use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::sorted_set::{FastHashMap, SortedSet};

/// Identifies one collection: the owning cache plus the collection name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    cache: String,
    name: Bytes,
}

impl CollectionKey {
    pub fn new(cache: impl Into<String>, name: impl Into<Bytes>) -> Self {
        Self {
            cache: cache.into(),
            name: name.into(),
        }
    }

    pub fn cache(&self) -> &str {
        &self.cache
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }
}

/// Per-call TTL policy for mutating operations.
///
/// `of` builds the refresh-on-update flavor: every successful mutation resets
/// the collection's expiration to now plus the supplied duration. With
/// `no_refresh_on_update` only collection creation stamps the expiration and
/// later mutations leave it alone, whatever duration they carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionTtl {
    ttl: Duration,
    refresh_on_update: bool,
}

impl CollectionTtl {
    pub fn of(ttl: Duration) -> Self {
        Self {
            ttl,
            refresh_on_update: true,
        }
    }

    pub fn no_refresh_on_update(mut self) -> Self {
        self.refresh_on_update = false;
        self
    }

    pub fn refresh_on_update(mut self) -> Self {
        self.refresh_on_update = true;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn refreshes_on_update(&self) -> bool {
        self.refresh_on_update
    }
}

/// Store-level defaults.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// TTL applied when a mutating call does not carry its own.
    pub default_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

struct Collection {
    set: SortedSet,
    expires_at: Instant,
}

impl Collection {
    fn new(ttl: &CollectionTtl) -> Self {
        Self {
            set: SortedSet::default(),
            expires_at: Instant::now() + ttl.ttl(),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn touch(&mut self, ttl: &CollectionTtl) {
        if ttl.refreshes_on_update() {
            self.expires_at = Instant::now() + ttl.ttl();
        }
    }
}

type Handle = Arc<Mutex<Collection>>;

/// Owns every live collection and serializes access per key.
///
/// The outer map lock is held only long enough to resolve or insert a handle;
/// all index reads and writes happen under that collection's mutex, so a
/// reader sees both indices at one point in time and a batch write becomes
/// visible all at once or not at all. A thread never acquires the map lock
/// while holding a collection mutex, which keeps independent collections from
/// blocking each other.
///
/// Expiry is checked lazily under the collection mutex; a collection past its
/// expiration is absent on every path. An emptied collection is dropped from
/// the map, so a later read is a miss rather than an empty hit.
pub struct SortedSetStore {
    collections: RwLock<FastHashMap<CollectionKey, Handle>>,
    config: StoreConfig,
}

impl Default for SortedSetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSetStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            collections: RwLock::new(FastHashMap::default()),
            config,
        }
    }

    pub fn default_ttl(&self) -> CollectionTtl {
        CollectionTtl::of(self.config.default_ttl)
    }

    /// Runs `f` against the collection when it exists, has not expired, and
    /// is non-empty.
    pub fn read<F, R>(&self, key: &CollectionKey, f: F) -> Option<R>
    where
        F: FnOnce(&SortedSet) -> R,
    {
        let handle = self.collections.read().get(key).cloned()?;
        let guard = handle.lock();
        if guard.is_expired() {
            drop(guard);
            self.evict_if_expired(key, &handle);
            return None;
        }
        if guard.set.is_empty() {
            return None;
        }
        Some(f(&guard.set))
    }

    /// Runs `f` against the collection, creating it first when absent or
    /// expired, then applies the TTL policy. An expired collection is
    /// replaced by a fresh one, which counts as creation for TTL purposes.
    pub fn write<F, R>(&self, key: &CollectionKey, ttl: CollectionTtl, f: F) -> R
    where
        F: FnOnce(&mut SortedSet) -> R,
    {
        let handle = {
            let mut map = self.collections.write();
            map.entry(key.clone())
                .or_insert_with(|| {
                    debug!(cache = key.cache(), "collection created");
                    Arc::new(Mutex::new(Collection::new(&ttl)))
                })
                .clone()
        };
        let (result, emptied) = {
            let mut guard = handle.lock();
            if guard.is_expired() {
                *guard = Collection::new(&ttl);
            }
            let result = f(&mut guard.set);
            guard.touch(&ttl);
            (result, guard.set.is_empty())
        };
        if emptied {
            self.remove_if(key, &handle, |c| c.set.is_empty());
        }
        result
    }

    /// Mutates an existing collection without creating one and without
    /// touching its TTL. Returns None when the collection is absent.
    pub fn update<F, R>(&self, key: &CollectionKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut SortedSet) -> R,
    {
        let handle = self.collections.read().get(key).cloned()?;
        let (result, emptied) = {
            let mut guard = handle.lock();
            if guard.is_expired() {
                drop(guard);
                self.evict_if_expired(key, &handle);
                return None;
            }
            let result = f(&mut guard.set);
            (result, guard.set.is_empty())
        };
        if emptied {
            self.remove_if(key, &handle, |c| c.set.is_empty());
        }
        Some(result)
    }

    /// Removes the collection outright. Returns whether a live (non-expired)
    /// collection was deleted.
    pub fn delete(&self, key: &CollectionKey) -> bool {
        match self.collections.write().remove(key) {
            Some(handle) => {
                debug!(cache = key.cache(), "collection deleted");
                !handle.lock().is_expired()
            }
            None => false,
        }
    }

    pub fn exists(&self, key: &CollectionKey) -> bool {
        self.read(key, |_| ()).is_some()
    }

    pub fn len(&self, key: &CollectionKey) -> Option<usize> {
        self.read(key, SortedSet::len)
    }

    /// Drops every expired collection, returning how many were removed.
    /// Space reclamation only; reads and writes never depend on it.
    pub fn purge_expired(&self) -> usize {
        let mut map = self.collections.write();
        let before = map.len();
        map.retain(|_, handle| !handle.lock().is_expired());
        before - map.len()
    }

    /// Removes every collection in every cache.
    pub fn clear(&self) {
        self.collections.write().clear();
    }

    pub fn collection_count(&self) -> usize {
        self.collections.read().len()
    }

    fn evict_if_expired(&self, key: &CollectionKey, handle: &Handle) {
        self.remove_if(key, handle, Collection::is_expired);
    }

    // Re-checks under the map write lock: the entry may have been replaced,
    // repopulated, or refreshed since the caller released the collection
    // mutex.
    fn remove_if<F>(&self, key: &CollectionKey, handle: &Handle, check: F)
    where
        F: FnOnce(&Collection) -> bool,
    {
        let mut map = self.collections.write();
        if let Some(current) = map.get(key) {
            if Arc::ptr_eq(current, handle) && check(&current.lock()) {
                map.remove(key);
                debug!(cache = key.cache(), "collection removed");
            }
        }
    }
}
