use alloy::primitives::Address;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};

use crate::models::{PoolRef, PoolSnapshot, PortfolioSummary};

/// Typed identity of a cached derived value. Keys are contract/account
/// identities, not names, so a changing pool set cannot leave stale
/// entries matched by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Snapshot(PoolRef),
    Portfolio(Address),
}

#[derive(Debug, Clone)]
enum CachedValue {
    Snapshot(PoolSnapshot),
    Portfolio(PortfolioSummary),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    cached_at: Instant,
}

/// TTL cache over derived pool/account values. Writers simply overwrite:
/// when a timer-driven and a transaction-driven refresh race, the later
/// write wins for that key and both converge on fresh chain state.
pub struct SnapshotCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    refresh: Notify,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            refresh: Notify::new(),
        }
    }

    /// Signalled after a transaction invalidates entries, so pollers can
    /// refetch immediately instead of waiting out the interval.
    pub fn refresh_signal(&self) -> &Notify {
        &self.refresh
    }

    pub async fn get_snapshot(&self, pool: &PoolRef) -> Option<PoolSnapshot> {
        let entries = self.entries.read().await;
        match entries.get(&CacheKey::Snapshot(*pool)) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => match &entry.value {
                CachedValue::Snapshot(snapshot) => Some(snapshot.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    pub async fn put_snapshot(&self, snapshot: PoolSnapshot) {
        let mut entries = self.entries.write().await;
        entries.insert(
            CacheKey::Snapshot(snapshot.pool),
            CacheEntry {
                value: CachedValue::Snapshot(snapshot),
                cached_at: Instant::now(),
            },
        );
    }

    pub async fn get_portfolio(&self, account: Address) -> Option<PortfolioSummary> {
        let entries = self.entries.read().await;
        match entries.get(&CacheKey::Portfolio(account)) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => match &entry.value {
                CachedValue::Portfolio(summary) => Some(summary.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    pub async fn put_portfolio(&self, summary: PortfolioSummary) {
        let mut entries = self.entries.write().await;
        entries.insert(
            CacheKey::Portfolio(summary.account),
            CacheEntry {
                value: CachedValue::Portfolio(summary),
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop every derived value a confirmed transaction can have changed,
    /// under a single write-lock acquisition so no reader observes the pool
    /// snapshot refreshed while the portfolio still reflects the old state.
    pub async fn invalidate_after_transaction(&self, pool: &PoolRef, account: Address) {
        {
            let mut entries = self.entries.write().await;
            entries.remove(&CacheKey::Snapshot(*pool));
            entries.remove(&CacheKey::Portfolio(account));
        }
        self.refresh.notify_one();
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
