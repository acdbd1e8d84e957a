// 🗂️ Catalog Aggregator - Fetch → parse → map → validate, per source
//
// Every aggregation run rebuilds the catalog from scratch. A source that fails
// to fetch or parse contributes zero records and one error message; the other
// sources are unaffected. Ids are assigned only after every source settles.

use crate::data_quality::{missing_fields, validate_record, SourceStats};
use crate::error::CatalogError;
use crate::fetch::{CatalogFetcher, SourceLocation};
use crate::parser::{parse_rows, SourceType};
use crate::record::CanonicalRecord;
use crate::schema::SchemaRegistry;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

// ============================================================================
// CONFIGURED SOURCES
// ============================================================================

/// One configured catalog: which mission, and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub source: SourceType,
    pub location: SourceLocation,
}

impl CatalogSource {
    pub fn new(source: SourceType, location: impl Into<SourceLocation>) -> Self {
        CatalogSource {
            source,
            location: location.into(),
        }
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// The output of one aggregation run. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub run_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub records: Vec<CanonicalRecord>,
    /// One human-readable message per failed source, in source order
    pub errors: Vec<String>,
    pub stats: Vec<SourceStats>,
}

impl CatalogSnapshot {
    /// The catalog before anything has been loaded
    pub fn empty() -> Self {
        CatalogSnapshot {
            run_id: Uuid::nil(),
            loaded_at: DateTime::<Utc>::default(),
            records: Vec::new(),
            errors: Vec::new(),
            stats: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: u32) -> Option<&CanonicalRecord> {
        // Ids are dense and 1-based, so the id doubles as an index
        let idx = usize::try_from(id).ok()?.checked_sub(1)?;
        self.records.get(idx).filter(|record| record.id == id)
    }

    pub fn failed_source_count(&self) -> usize {
        self.errors.len()
    }

    /// "N sources failed: ..." or `None` when every source loaded
    pub fn error_summary(&self) -> Option<String> {
        match self.errors.len() {
            0 => None,
            1 => Some(format!("1 source failed: {}", self.errors[0])),
            n => Some(format!("{} sources failed: {}", n, self.errors.join("; "))),
        }
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Run one source's text through parse → map → validate.
/// Records come back with `id == 0`.
pub fn ingest_source(
    registry: &SchemaRegistry,
    source: SourceType,
    text: &str,
) -> Result<(Vec<CanonicalRecord>, SourceStats), CatalogError> {
    let rows = parse_rows(source, text)?;
    let mut stats = SourceStats::new(source);
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        stats.rows_read += 1;

        let Some(mapped) = registry.map_row(source, row) else {
            stats.rejected += 1;
            continue;
        };

        let missing = missing_fields(&mapped);
        match validate_record(mapped) {
            Some(record) => {
                stats.accepted += 1;
                records.push(record);
            }
            None => {
                stats.rejected += 1;
                stats.missing.record(&missing);
            }
        }
    }

    debug!(
        "{source}: {} rows dropped (period {}, radius {}, temperature {})",
        stats.rejected, stats.missing.period, stats.missing.radius, stats.missing.equilibrium_temp
    );

    Ok((records, stats))
}

/// Merge per-source outcomes (already in source order) into one snapshot.
pub fn aggregate(
    registry: &SchemaRegistry,
    outcomes: Vec<(SourceType, Result<String, CatalogError>)>,
) -> CatalogSnapshot {
    let ingested = outcomes
        .into_iter()
        .map(|(source, fetched)| {
            let result = fetched.and_then(|text| ingest_source(registry, source, &text));
            (source, result)
        })
        .collect();
    assemble(ingested)
}

fn assemble(
    ingested: Vec<(SourceType, Result<(Vec<CanonicalRecord>, SourceStats), CatalogError>)>,
) -> CatalogSnapshot {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut stats = Vec::new();

    for (source, result) in ingested {
        match result {
            Ok((mut source_records, source_stats)) => {
                info!("{}", source_stats.summary());
                records.append(&mut source_records);
                stats.push(source_stats);
            }
            Err(err) => {
                let message = err.to_string();
                warn!("{message}");
                stats.push(SourceStats::failed(source, message.clone()));
                errors.push(message);
            }
        }
    }

    for (idx, record) in records.iter_mut().enumerate() {
        record.id = idx as u32 + 1;
    }

    CatalogSnapshot {
        run_id: Uuid::new_v4(),
        loaded_at: Utc::now(),
        records,
        errors,
        stats,
    }
}

/// CatalogLoader - Runs aggregation runs against a fetcher
#[derive(Clone)]
pub struct CatalogLoader {
    registry: Arc<SchemaRegistry>,
    fetcher: Arc<dyn CatalogFetcher>,
}

impl CatalogLoader {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self::with_registry(fetcher, SchemaRegistry::new())
    }

    pub fn with_registry(fetcher: Arc<dyn CatalogFetcher>, registry: SchemaRegistry) -> Self {
        CatalogLoader {
            registry: Arc::new(registry),
            fetcher,
        }
    }

    /// One full aggregation run.
    ///
    /// Sources are fetched and ingested concurrently on the blocking pool and
    /// the run waits for all of them. Dropping the returned future aborts the
    /// outstanding tasks and discards whatever they produce.
    pub async fn load(&self, sources: &[CatalogSource]) -> CatalogSnapshot {
        let mut tasks = JoinSet::new();

        for (idx, configured) in sources.iter().cloned().enumerate() {
            let registry = Arc::clone(&self.registry);
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn_blocking(move || {
                let result = fetcher
                    .fetch(configured.source, &configured.location)
                    .and_then(|text| ingest_source(&registry, configured.source, &text));
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<(Vec<CanonicalRecord>, SourceStats), CatalogError>>> =
            sources.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(err) => warn!("catalog fetch task ended abnormally: {err}"),
            }
        }

        let ingested = sources
            .iter()
            .zip(slots)
            .map(|(configured, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(CatalogError::SourceFetch {
                        source_type: configured.source,
                        location: configured.location.to_string(),
                        reason: "fetch task did not complete".to_string(),
                    })
                });
                (configured.source, result)
            })
            .collect();

        assemble(ingested)
    }
}

/// Load every configured source with the default column tables.
pub async fn load_catalog(sources: &[CatalogSource], fetcher: Arc<dyn CatalogFetcher>) -> CatalogSnapshot {
    CatalogLoader::new(fetcher).load(sources).await
}

// ============================================================================
// CATALOG STORE
// ============================================================================

struct Published {
    generation: u64,
    snapshot: Arc<CatalogSnapshot>,
}

/// CatalogStore - Holds the published snapshot and replaces it on reload
///
/// Readers clone the `Arc` and keep a consistent catalog for as long as they
/// like; a reload swaps in a whole new snapshot. A run that started earlier
/// never overwrites one that started later.
pub struct CatalogStore {
    loader: CatalogLoader,
    sources: Vec<CatalogSource>,
    current: RwLock<Published>,
    generations: AtomicU64,
}

impl CatalogStore {
    pub fn new(sources: Vec<CatalogSource>, loader: CatalogLoader) -> Self {
        CatalogStore {
            loader,
            sources,
            current: RwLock::new(Published {
                generation: 0,
                snapshot: Arc::new(CatalogSnapshot::empty()),
            }),
            generations: AtomicU64::new(0),
        }
    }

    pub fn sources(&self) -> &[CatalogSource] {
        &self.sources
    }

    /// The currently published catalog
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current.snapshot)
    }

    /// Run a full aggregation and publish it. Returns the catalog that is
    /// current afterwards.
    pub async fn reload(&self) -> Arc<CatalogSnapshot> {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.loader.load(&self.sources).await;
        self.publish(generation, Arc::new(snapshot))
    }

    /// Start a reload in the background; cancel it through the handle.
    pub fn spawn_reload(self: &Arc<Self>) -> ReloadHandle {
        let store = Arc::clone(self);
        ReloadHandle {
            task: tokio::spawn(async move { store.reload().await }),
        }
    }

    fn publish(&self, generation: u64, snapshot: Arc<CatalogSnapshot>) -> Arc<CatalogSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if generation > current.generation {
            info!(
                "publishing catalog run {} ({} records, {} failed sources)",
                snapshot.run_id,
                snapshot.len(),
                snapshot.failed_source_count()
            );
            current.generation = generation;
            current.snapshot = snapshot;
        } else {
            debug!("discarding superseded catalog run {}", snapshot.run_id);
        }
        Arc::clone(&current.snapshot)
    }
}

/// A reload running in the background. Dropping the handle cancels it.
pub struct ReloadHandle {
    task: JoinHandle<Arc<CatalogSnapshot>>,
}

impl ReloadHandle {
    /// Abort the reload. In-flight fetches are dropped and nothing is published.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// The published catalog, or `None` if the reload was cancelled
    pub async fn wait(mut self) -> Option<Arc<CatalogSnapshot>> {
        (&mut self.task).await.ok()
    }
}

impl Drop for ReloadHandle {
    fn drop(&mut self) {
        // No-op once the task has finished
        self.task.abort();
    }
}

// ============================================================================
// TESTS
// ============================================================================
