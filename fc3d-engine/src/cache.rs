use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::window::DrawHistory;

/// Key identifying a loaded history: latest period and draw count.
pub type CacheKey = (Option<String>, usize);

type Slot = Option<(CacheKey, DrawHistory)>;

/// Explicit holder of the last built history. Callers pass the key of the
/// data they are about to load; a matching key reuses the cached history.
/// The ingestion side calls [`HistoryCache::invalidate`] after each refresh.
#[derive(Debug, Default)]
pub struct HistoryCache {
    slot: RwLock<Slot>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_of(history: &DrawHistory) -> CacheKey {
        (history.latest_period().map(str::to_string), history.len())
    }

    // The slot is only ever replaced whole, so a lock poisoned by a panicking
    // holder still guards a usable value.
    fn read_slot(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(|e| {
            log::warn!("history cache lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(|e| {
            log::warn!("history cache lock poisoned, recovering");
            e.into_inner()
        })
    }

    pub fn get(&self, key: &CacheKey) -> Option<DrawHistory> {
        let guard = self.read_slot();
        match guard.as_ref() {
            Some((k, h)) if k == key => Some(h.clone()),
            _ => None,
        }
    }

    /// Returns the cached history for `key`, building and storing it on a miss.
    pub fn get_or_insert_with<F, E>(&self, key: CacheKey, build: F) -> Result<DrawHistory, E>
    where
        F: FnOnce() -> Result<DrawHistory, E>,
    {
        if let Some(h) = self.get(&key) {
            log::debug!("history cache hit ({:?}, {})", key.0, key.1);
            return Ok(h);
        }
        let history = build()?;
        log::info!("history cache refreshed: {} draws, latest {:?}", history.len(), key.0);
        *self.write_slot() = Some((key, history.clone()));
        Ok(history)
    }

    pub fn invalidate(&self) {
        *self.write_slot() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.read_slot().is_none()
    }
}

/// Shared handle for callers that serve several requests at once.
pub type SharedHistoryCache = Arc<HistoryCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::make_test_history;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[test]
    fn test_builds_once_per_key() {
        let cache = HistoryCache::new();
        let history = make_test_history(12);
        let key = HistoryCache::key_of(&history);
        let calls = Cell::new(0);

        for _ in 0..3 {
            let h = cache
                .get_or_insert_with(key.clone(), || {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(history.clone())
                })
                .unwrap();
            assert_eq!(h.len(), 12);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_new_key_rebuilds() {
        let cache = HistoryCache::new();
        let old = make_test_history(12);
        let new = make_test_history(13);
        cache
            .get_or_insert_with(HistoryCache::key_of(&old), || Ok::<_, Infallible>(old.clone()))
            .unwrap();
        let h = cache
            .get_or_insert_with(HistoryCache::key_of(&new), || Ok::<_, Infallible>(new.clone()))
            .unwrap();
        assert_eq!(h.len(), 13);
        assert!(cache.get(&HistoryCache::key_of(&old)).is_none());
    }

    #[test]
    fn test_invalidate_clears() {
        let cache = HistoryCache::new();
        let history = make_test_history(5);
        let key = HistoryCache::key_of(&history);
        cache.get_or_insert_with(key.clone(), || Ok::<_, Infallible>(history.clone())).unwrap();
        assert!(!cache.is_empty());
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_build_error_leaves_cache_empty() {
        let cache = HistoryCache::new();
        let result = cache.get_or_insert_with((None, 0), || Err::<DrawHistory, _>("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let cache = Arc::new(HistoryCache::new());
        let history = make_test_history(8);
        let key = HistoryCache::key_of(&history);
        cache.get_or_insert_with(key.clone(), || Ok::<_, Infallible>(history.clone())).unwrap();

        let holder = Arc::clone(&cache);
        let joined = std::thread::spawn(move || {
            let _guard = holder.slot.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(cache.slot.is_poisoned());

        assert_eq!(cache.get(&key).map(|h| h.len()), Some(8));
        assert!(!cache.is_empty());
        cache.invalidate();
        assert!(cache.is_empty());

        let calls = Cell::new(0);
        for _ in 0..2 {
            cache
                .get_or_insert_with(key.clone(), || {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(history.clone())
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache: SharedHistoryCache = Arc::new(HistoryCache::new());
        let history = make_test_history(20);
        let key = HistoryCache::key_of(&history);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let history = history.clone();
                let key = key.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_insert_with(key, || Ok::<_, Infallible>(history))
                        .unwrap()
                        .len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 20);
        }
    }
}
