//! Injectable cache for team supply lists
//!
//! Route handlers keep a short-lived copy of each team's supply list and
//! invalidate it explicitly after every mutation. The cache is plain shared
//! state on [`crate::AppState`], not a module-level global.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use shared::models::Supply;
use uuid::Uuid;

struct CacheEntry {
    cached_at: Instant,
    supplies: Vec<Supply>,
}

/// Per-team cache of active supply lists with a fixed TTL
pub struct SupplyListCache {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, CacheEntry>>,
}

impl SupplyListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached list for a team, if still fresh
    pub fn get(&self, team_id: Uuid) -> Option<Vec<Supply>> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(&team_id)?;
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.supplies.clone())
    }

    /// Store a freshly fetched list
    pub fn put(&self, team_id: Uuid, supplies: Vec<Supply>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            team_id,
            CacheEntry {
                cached_at: Instant::now(),
                supplies,
            },
        );
    }

    /// Drop a team's cached list. Called after any supply mutation.
    pub fn invalidate(&self, team_id: Uuid) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(&team_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = SupplyListCache::new(Duration::from_secs(60));
        assert!(cache.get(team()).is_none());
    }

    #[test]
    fn test_put_then_get() {
        let cache = SupplyListCache::new(Duration::from_secs(60));
        let team_id = team();
        cache.put(team_id, vec![]);
        assert!(cache.get(team_id).is_some());
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let cache = SupplyListCache::new(Duration::from_secs(60));
        let team_id = team();
        cache.put(team_id, vec![]);
        cache.invalidate(team_id);
        assert!(cache.get(team_id).is_none());
    }

    #[test]
    fn test_expired_entry_misses() {
        let cache = SupplyListCache::new(Duration::ZERO);
        let team_id = team();
        cache.put(team_id, vec![]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(team_id).is_none());
    }

    #[test]
    fn test_teams_are_isolated() {
        let cache = SupplyListCache::new(Duration::from_secs(60));
        let a = team();
        let b = team();
        cache.put(a, vec![]);
        cache.invalidate(b);
        assert!(cache.get(a).is_some());
        assert!(cache.get(b).is_none());
    }
}
