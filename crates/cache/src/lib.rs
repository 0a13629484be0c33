use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use dashmap::DashMap;

pub mod entry;
pub mod remote;

pub use entry::{CacheEntry, CacheError};
pub use remote::{ObjectStoreMirror, RemoteMirror};

/// Background sweeper period (§4.3: "one per process, period 10 s").
pub const SWEEP_PERIOD: Duration = Duration::from_secs(10);
/// Grace period a removal tombstone stays visible-as-absent before the node
/// is dropped entirely (§4.3).
pub const REMOVAL_GRACE: Duration = Duration::from_secs(30);

/// Default entry lifetime passed to `VersionedCache::new` by the composition
/// root. §4.3 fixes the sweep period and removal grace but leaves the TTL
/// itself to the caller; five minutes is an order of magnitude above every
/// owning collector's own period (the slowest, dispatch posts, re-writes
/// every 10 s), so a live entry never expires between its own refreshes and
/// a genuinely stuck collector is still caught well within a sweep cycle's
/// worth of staleness.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct NodeState<T> {
    value: Option<T>,
    version: i64,
    written_at: Instant,
    removed_at: Option<Instant>,
}

impl<T: CacheEntry> NodeState<T> {
    fn live(value: T) -> Self {
        Self {
            version: value.version(),
            value: Some(value),
            written_at: Instant::now(),
            removed_at: None,
        }
    }

    fn removed_from(prev: &NodeState<T>) -> Self {
        Self {
            value: None,
            version: prev.version,
            written_at: prev.written_at,
            removed_at: Some(Instant::now()),
        }
    }
}

enum InstallOutcome<T> {
    Inserted,
    Replaced(T),
    Noop,
}

/// §4.3 versioned data cache: local write-through map with an optional
/// remote byte-bucket mirror used only for crash recovery. Reads never
/// touch the remote store outside `pull()`.
pub struct VersionedCache<T: CacheEntry> {
    key_prefix: String,
    ttl: Duration,
    removal_grace: Duration,
    primary: DashMap<String, Arc<ArcSwap<NodeState<T>>>>,
    secondary: DashMap<String, String>,
    remote: Option<Arc<dyn RemoteMirror>>,
}

impl<T: CacheEntry> VersionedCache<T> {
    pub fn new(key_prefix: impl Into<String>, ttl: Duration, remote: Option<Arc<dyn RemoteMirror>>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            ttl,
            removal_grace: REMOVAL_GRACE,
            primary: DashMap::new(),
            secondary: DashMap::new(),
            remote,
        }
    }

    pub fn find_primary(&self, key: &str) -> Option<T> {
        self.primary.get(key).and_then(|node| node.load().value.clone())
    }

    pub fn find_secondary(&self, key: &str) -> Option<T> {
        let primary_key = self.secondary.get(key)?.clone();
        self.find_primary(&primary_key)
    }

    /// CAS-style swap (§4.3): installs iff no node exists yet, or
    /// `version(v) > version(current)`. Returns the value that was replaced,
    /// or `None` if nothing was replaced (either a fresh insert or a no-op).
    pub fn update_local(&self, value: T) -> Option<T> {
        match self.install(value) {
            InstallOutcome::Replaced(old) => Some(old),
            InstallOutcome::Inserted | InstallOutcome::Noop => None,
        }
    }

    /// As `update_local`, plus an asynchronous write of the encoded value to
    /// the remote mirror when something was actually installed.
    pub fn set(&self, value: T) -> Option<T> {
        let mirror_key = self.mirror_key(&value.primary_key());
        let encoded = value.encode();
        let outcome = self.install(value);
        let installed = !matches!(outcome, InstallOutcome::Noop);
        if installed {
            if let Some(remote) = self.remote.clone() {
                tokio::spawn(async move {
                    if let Err(err) = remote.put(&mirror_key, encoded).await {
                        tracing::warn!(error = %err, "cache remote mirror write failed");
                    }
                });
            }
        }
        match outcome {
            InstallOutcome::Replaced(old) => Some(old),
            InstallOutcome::Inserted | InstallOutcome::Noop => None,
        }
    }

    /// Marks the node at `key` removed. It stays visible to `find_primary`
    /// as absent but is retained for `removal_grace` so a late writer racing
    /// the removal can observe it (§4.3). Returns whether a node existed.
    pub fn remove_primary(&self, key: &str) -> bool {
        let Some(node) = self.primary.get(key).map(|n| n.clone()) else {
            return false;
        };
        loop {
            let current = node.load();
            if current.removed_at.is_some() {
                return true;
            }
            let replacement = Arc::new(NodeState::removed_from(&current));
            let previous = node.compare_and_swap(&current, replacement);
            if Arc::ptr_eq(&previous, &current) {
                return true;
            }
        }
    }

    /// At start-up only: rehydrates the local map from the remote mirror.
    pub async fn pull(&self) -> Result<usize, CacheError> {
        let entries = match &self.remote {
            Some(remote) => remote.scan_prefix(&self.key_prefix).await?,
            None => return Ok(0),
        };
        let mut count = 0;
        for (key, bytes) in entries {
            match T::decode(&bytes) {
                Ok(value) => {
                    self.update_local(value);
                    count += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, key, "skipping undecodable remote cache entry during pull");
                }
            }
        }
        Ok(count)
    }

    /// Snapshot of every currently-live (non-removed) primary value. Used by
    /// the composition root to discover the current server set and spawn or
    /// retire per-server collectors without adding a second source of truth.
    pub fn live_values(&self) -> Vec<T> {
        self.primary.iter().filter_map(|entry| entry.value().load().value.clone()).collect()
    }

    /// One pass of the background sweeper (§4.3): tombstones stale live
    /// nodes, drops tombstones past their grace period.
    pub fn sweep_once(&self) {
        let now = Instant::now();
        let mut to_drop = Vec::new();
        for entry in self.primary.iter() {
            let node = entry.value().clone();
            let state = node.load();
            if let Some(removed_at) = state.removed_at {
                if now.duration_since(removed_at) >= self.removal_grace {
                    to_drop.push(entry.key().clone());
                }
            } else if now.duration_since(state.written_at) >= self.ttl {
                let replacement = Arc::new(NodeState::removed_from(&state));
                let _ = node.compare_and_swap(&state, replacement);
            }
        }
        for key in to_drop {
            self.primary.remove(&key);
        }
    }

    fn install(&self, value: T) -> InstallOutcome<T> {
        let primary_key = value.primary_key();
        let secondary_key = value.secondary_key();
        let outcome = match self.primary.get(&primary_key) {
            None => {
                self.primary
                    .insert(primary_key.clone(), Arc::new(ArcSwap::new(Arc::new(NodeState::live(value)))));
                InstallOutcome::Inserted
            }
            Some(existing) => {
                let node = existing.clone();
                drop(existing);
                loop {
                    let current = node.load();
                    if value.version() <= current.version {
                        break InstallOutcome::Noop;
                    }
                    let replacement = Arc::new(NodeState::live(value.clone()));
                    let previous = node.compare_and_swap(&current, replacement);
                    if Arc::ptr_eq(&previous, &current) {
                        break InstallOutcome::Replaced(
                            current.value.clone().unwrap_or_else(|| value.clone()),
                        );
                    }
                }
            }
        };
        if let Some(secondary_key) = secondary_key {
            self.secondary.insert(secondary_key, primary_key);
        }
        outcome
    }

    fn mirror_key(&self, primary_key: &str) -> String {
        format!("{}/{}", self.key_prefix, primary_key)
    }
}

/// Spawns the one-per-process background sweeper (§4.3) for this cache,
/// stopping when `shutdown` is cancelled.
pub fn spawn_sweeper<T: CacheEntry>(
    cache: Arc<VersionedCache<T>>,
    shutdown: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_PERIOD);
        loop {
            tokio::select! {
                _ = interval.tick() => cache.sweep_once(),
                _ = shutdown.cancelled() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestValue {
        key: String,
        version: i64,
    }

    impl CacheEntry for TestValue {
        fn version(&self) -> i64 {
            self.version
        }

        fn primary_key(&self) -> String {
            self.key.clone()
        }

        fn encode(&self) -> Vec<u8> {
            format!("{}:{}", self.key, self.version).into_bytes()
        }

        fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
            let text = String::from_utf8_lossy(bytes);
            let (key, version) = text.split_once(':').ok_or_else(|| CacheError::Decode(text.to_string()))?;
            Ok(Self {
                key: key.to_string(),
                version: version.parse().map_err(|_| CacheError::Decode(text.to_string()))?,
            })
        }
    }

    #[test]
    fn s5_cache_swap_scenario() {
        let cache: VersionedCache<TestValue> = VersionedCache::new("srv", Duration::from_secs(60), None);
        let v1 = TestValue { key: "k".into(), version: 10 };
        assert_eq!(cache.update_local(v1.clone()), None);

        let v2 = TestValue { key: "k".into(), version: 9 };
        assert_eq!(cache.update_local(v2), None);
        assert_eq!(cache.find_primary("k"), Some(v1.clone()));

        let v3 = TestValue { key: "k".into(), version: 11 };
        assert_eq!(cache.update_local(v3.clone()), Some(v1));
        assert_eq!(cache.find_primary("k"), Some(v3));
    }

    #[test]
    fn removal_is_invisible_but_retained() {
        let cache: VersionedCache<TestValue> = VersionedCache::new("srv", Duration::from_secs(60), None);
        cache.update_local(TestValue { key: "k".into(), version: 1 });
        assert!(cache.remove_primary("k"));
        assert_eq!(cache.find_primary("k"), None);
        // still present internally until the sweeper's grace period elapses
        assert!(cache.primary.contains_key("k"));
    }

    #[test]
    fn sweep_drops_expired_tombstones() {
        let cache: VersionedCache<TestValue> = VersionedCache::new("srv", Duration::from_millis(1), None);
        cache.update_local(TestValue { key: "k".into(), version: 1 });
        std::thread::sleep(Duration::from_millis(5));
        cache.sweep_once();
        // now tombstoned by TTL expiry, but not yet past removal grace
        assert_eq!(cache.find_primary("k"), None);
        assert!(cache.primary.contains_key("k"));
    }
}
