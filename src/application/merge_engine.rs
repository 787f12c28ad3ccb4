//! Merge/persist engine
//!
//! Folds the scraped records of a run into the persisted snapshot, keeps the
//! change cache fresh, and writes the full snapshot back.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::product::ProductRecord;
use crate::domain::repositories::{ChangeCache, SnapshotStore, StoreError};
use crate::domain::snapshot::{PersistedSnapshot, Upsert};

/// Counters for one merge
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MergeReport {
    /// Distinct titles inserted or re-priced; the run's output count
    pub changed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Records whose cached price already matched
    pub cache_hits: usize,
    pub snapshot_size: usize,
}

pub struct MergeEngine {
    store: Arc<dyn SnapshotStore>,
    cache: Arc<dyn ChangeCache>,
}

impl MergeEngine {
    pub fn new(store: Arc<dyn SnapshotStore>, cache: Arc<dyn ChangeCache>) -> Self {
        Self { store, cache }
    }

    /// Load the snapshot, merge `records` in order, save the full result
    pub async fn merge_and_persist(&self, records: Vec<ProductRecord>) -> Result<MergeReport, StoreError> {
        let mut snapshot = PersistedSnapshot::from_records(self.store.load().await?);
        debug!(
            "Loaded snapshot with {} records from {} store",
            snapshot.len(),
            self.store.backend_name()
        );

        let report = self.merge_into(&mut snapshot, records).await;

        self.store.save(snapshot.records()).await?;
        info!(
            "📦 Merge complete: {} changed ({} new, {} updated, {} unchanged), snapshot size {}",
            report.changed, report.inserted, report.updated, report.unchanged, report.snapshot_size
        );
        Ok(report)
    }

    /// Apply records to an in-memory snapshot; cache failures are logged and ignored
    pub async fn merge_into(&self, snapshot: &mut PersistedSnapshot, records: Vec<ProductRecord>) -> MergeReport {
        let mut report = MergeReport::default();
        let mut changed_titles: HashSet<String> = HashSet::new();

        for record in records {
            match self.cache.get(record.title()).await {
                Ok(Some(cached)) if record.same_price(cached) => {
                    debug!("Cache hit for '{}' at {}", record.title(), cached);
                    report.cache_hits += 1;
                }
                Ok(_) => {}
                Err(e) => warn!("Change cache lookup failed for '{}': {}", record.title(), e),
            }

            if let Err(e) = self.cache.set(record.title(), record.price()).await {
                warn!("Change cache update failed for '{}': {}", record.title(), e);
            }

            let title = record.title().to_string();
            match snapshot.upsert(record) {
                Upsert::Inserted => {
                    report.inserted += 1;
                    changed_titles.insert(title);
                }
                Upsert::Updated => {
                    report.updated += 1;
                    changed_titles.insert(title);
                }
                Upsert::Unchanged => report.unchanged += 1,
            }
        }

        report.changed = changed_titles.len();
        report.snapshot_size = snapshot.len();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::CacheError;
    use crate::infrastructure::change_cache::InMemoryChangeCache;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<ProductRecord>>,
        saves: Mutex<usize>,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn load(&self) -> Result<Vec<ProductRecord>, StoreError> {
            Ok(self.rows.lock().await.clone())
        }

        async fn save(&self, records: &[ProductRecord]) -> Result<(), StoreError> {
            *self.rows.lock().await = records.to_vec();
            *self.saves.lock().await += 1;
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "test"
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl ChangeCache for BrokenCache {
        async fn get(&self, _title: &str) -> Result<Option<f64>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _title: &str, _price: f64) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn record(title: &str, price: f64) -> ProductRecord {
        ProductRecord::new(title, price, format!("images/{title}.jpg")).unwrap()
    }

    fn engine_with(rows: Vec<ProductRecord>) -> (Arc<MemoryStore>, Arc<InMemoryChangeCache>, MergeEngine) {
        let store = Arc::new(MemoryStore {
            rows: Mutex::new(rows),
            saves: Mutex::new(0),
        });
        let cache = Arc::new(InMemoryChangeCache::new());
        let engine = MergeEngine::new(store.clone(), cache.clone());
        (store, cache, engine)
    }

    #[tokio::test]
    async fn identical_price_is_not_a_change() {
        let (store, _, engine) = engine_with(vec![record("Widget A", 10.0)]);

        let report = engine.merge_and_persist(vec![record("Widget A", 10.0)]).await.unwrap();

        assert_eq!(report.changed, 0);
        assert_eq!(report.unchanged, 1);
        assert_eq!(*store.rows.lock().await, vec![record("Widget A", 10.0)]);
    }

    #[tokio::test]
    async fn changed_price_replaces_entry() {
        let (store, _, engine) = engine_with(vec![record("Widget A", 10.0)]);

        let report = engine.merge_and_persist(vec![record("Widget A", 12.0)]).await.unwrap();

        assert_eq!(report.changed, 1);
        assert_eq!(report.updated, 1);
        let rows = store.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].same_price(12.0));
    }

    #[tokio::test]
    async fn new_titles_are_inserted_and_counted() {
        let (store, _, engine) = engine_with(vec![]);

        let report = engine
            .merge_and_persist(vec![record("Widget A", 10.0), record("Widget B", 5.0)])
            .await
            .unwrap();

        assert_eq!(report.changed, 2);
        assert_eq!(report.snapshot_size, 2);
        assert_eq!(store.rows.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn full_snapshot_is_saved_even_without_changes() {
        let (store, _, engine) = engine_with(vec![record("A", 1.0), record("B", 2.0)]);

        let report = engine.merge_and_persist(vec![]).await.unwrap();

        assert_eq!(report.changed, 0);
        assert_eq!(*store.saves.lock().await, 1);
        assert_eq!(store.rows.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn cache_hit_does_not_skip_snapshot_comparison() {
        let (store, cache, engine) = engine_with(vec![]);
        // Cache already knows the price but the snapshot has never seen the title
        cache.set("Widget A", 10.0).await.unwrap();

        let report = engine.merge_and_persist(vec![record("Widget A", 10.0)]).await.unwrap();

        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.changed, 1);
        assert_eq!(store.rows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn cache_is_updated_to_latest_price() {
        let (_, cache, engine) = engine_with(vec![record("Widget A", 10.0)]);

        engine.merge_and_persist(vec![record("Widget A", 10.0)]).await.unwrap();
        engine.merge_and_persist(vec![record("Widget A", 11.0)]).await.unwrap();

        assert_eq!(cache.get("Widget A").await.unwrap(), Some(11.0));
    }

    #[tokio::test]
    async fn duplicate_title_in_one_run_counts_once() {
        let (store, _, engine) = engine_with(vec![]);

        let report = engine
            .merge_and_persist(vec![record("A", 1.0), record("A", 2.0)])
            .await
            .unwrap();

        assert_eq!(report.changed, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert!(store.rows.lock().await[0].same_price(2.0));
    }

    #[tokio::test]
    async fn broken_cache_never_loses_records() {
        let store = Arc::new(MemoryStore::default());
        let engine = MergeEngine::new(store.clone(), Arc::new(BrokenCache));

        let report = engine
            .merge_and_persist(vec![record("A", 1.0), record("B", 2.0)])
            .await
            .unwrap();

        assert_eq!(report.changed, 2);
        assert_eq!(report.cache_hits, 0);
        assert_eq!(store.rows.lock().await.len(), 2);
    }
}
