//! Market snapshot cache.
//!
//! Holds the most recent set of pairs from the market feed so exit
//! evaluation and entry evaluation within one cycle operate on the same
//! data. The cache is replaced wholesale on every successful scan; a
//! failed scan leaves the previous snapshot in place.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::Pair;

/// The latest market snapshot, indexed by pair id.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    pairs: HashMap<String, Pair>,
    fetched_at: Option<DateTime<Utc>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire snapshot. Pairs from previous scans are
    /// discarded, including any the new snapshot no longer lists.
    pub fn replace(&mut self, pairs: Vec<Pair>, fetched_at: DateTime<Utc>) {
        self.pairs = pairs.into_iter().map(|p| (p.id.clone(), p)).collect();
        self.fetched_at = Some(fetched_at);
    }

    /// Look up a pair by id in the current snapshot.
    pub fn get(&self, pair_id: &str) -> Option<&Pair> {
        self.pairs.get(pair_id)
    }

    /// The snapshot as an id → pair index.
    pub fn by_id(&self) -> &HashMap<String, Pair> {
        &self.pairs
    }

    /// Pairs ordered by descending 24h volume — the entry-scan order.
    pub fn pairs_by_volume(&self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self.pairs.values().cloned().collect();
        pairs.sort_by(|a, b| {
            b.volume_24h_usd
                .partial_cmp(&a.volume_24h_usd)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }

    /// Point-in-time copy of all pairs, for the status reporter.
    pub fn all_pairs(&self) -> Vec<Pair> {
        self.pairs.values().cloned().collect()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::risk::classify;

    fn pair(id: &str, volume: f64) -> Pair {
        Pair::new(id, id, id, 1.0, 50_000.0, volume, classify(50_000.0, volume)).unwrap()
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = SnapshotCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert!(cache.fetched_at().is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut cache = SnapshotCache::new();
        cache.replace(vec![pair("a", 10.0), pair("b", 20.0)], Utc::now());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());

        cache.replace(vec![pair("c", 30.0)], Utc::now());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none(), "old pairs must not survive a replace");
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_pairs_by_volume_descending() {
        let mut cache = SnapshotCache::new();
        cache.replace(
            vec![pair("low", 100.0), pair("high", 9_000.0), pair("mid", 500.0)],
            Utc::now(),
        );
        let ordered = cache.pairs_by_volume();
        let ids: Vec<&str> = ordered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_fetched_at_recorded() {
        let mut cache = SnapshotCache::new();
        let now = Utc::now();
        cache.replace(vec![pair("a", 1.0)], now);
        assert_eq!(cache.fetched_at(), Some(now));
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut cache = SnapshotCache::new();
        cache.replace(vec![pair("a", 1.0), pair("a", 2.0)], Utc::now());
        assert_eq!(cache.len(), 1);
    }
}
