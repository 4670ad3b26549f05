use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::hash::Hash;

/// A memo table for one validation pass.
///
/// Values are cloned out, so large values should be wrapped in an `Arc`.
/// The factory runs without the lock held and may itself use the cache; if two
/// callers race on one key, the first value stored wins.
#[derive(Debug)]
pub struct Cache<K, V> {
    map: Mutex<FxHashMap<K, V>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            map: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.lock().get(key).cloned()
    }

    pub fn get_or_add(&self, key: K, factory: impl FnOnce(&K) -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = factory(&key);
        self.map.lock().entry(key).or_insert(value).clone()
    }

    pub fn clear(&self) {
        self.map.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn factory_runs_once_per_key() {
        let cache: Cache<String, usize> = Cache::new();
        let calls = Cell::new(0);
        let compute = |key: &String| {
            calls.set(calls.get() + 1);
            key.len()
        };
        assert_eq!(cache.get_or_add("alpha".into(), compute), 5);
        assert_eq!(cache.get_or_add("alpha".into(), |_| unreachable!()), 5);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.get(&"alpha".to_string()), Some(5));
    }

    #[test]
    fn factories_may_reenter() {
        let cache: Cache<u32, u64> = Cache::new();
        fn depth(cache: &Cache<u32, u64>, n: u32) -> u64 {
            cache.get_or_add(n, |&n| if n == 0 { 1 } else { depth(cache, n - 1) * 2 })
        }
        assert_eq!(depth(&cache, 10), 1024);
        assert_eq!(cache.len(), 11);
        cache.clear();
        assert!(cache.is_empty());
    }
}
