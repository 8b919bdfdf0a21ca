use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info_span;

use crate::config::{DatasetConfig, RecordKind};
use crate::error::ConfigError;
use crate::extract::{Diagnostic, ExtractionResult, RecordExtractor, SubmittalRecord};
use crate::sheet::decode_workbook;

use super::clock::{Clock, SystemClock};
use super::source::SheetSource;

/// Default maximum age of a cached batch before a read triggers a refresh.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(30);

/// Returned by `force_refresh` for upload-confirmation UX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub record_count: usize,
    pub diagnostic_count: usize,
}

struct CacheSlot {
    records: Arc<Vec<SubmittalRecord>>,
    diagnostics: Arc<Vec<Diagnostic>>,
    /// `None` until the first refresh completes (successfully or not).
    refreshed_at: Option<DateTime<Utc>>,
    /// Bumped on every slot write; lets waiting refreshers detect that the
    /// refresh they queued behind already did the work.
    generation: u64,
}

impl CacheSlot {
    fn empty() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            diagnostics: Arc::new(Vec::new()),
            refreshed_at: None,
            generation: 0,
        }
    }
}

struct DatasetState {
    config: Arc<DatasetConfig>,
    extractor: RecordExtractor,
    slot: RwLock<CacheSlot>,
    /// Single-writer guard: at most one extraction in flight per dataset.
    refresh_lock: Mutex<()>,
}

/// Owns the per-dataset record batches and decides when to re-extract.
///
/// Batches are built off-lock and swapped in whole, so a concurrent reader
/// observes either the previous complete batch or the new one, never a
/// partial state. Refresh failures degrade: the previous records stay
/// authoritative and the failure surfaces through `diagnostics()`, never as
/// a panic or error on the read path.
pub struct IngestionCache {
    datasets: HashMap<RecordKind, DatasetState>,
    source: Arc<dyn SheetSource>,
    clock: Arc<dyn Clock>,
    staleness: chrono::Duration,
}

impl IngestionCache {
    /// Production constructor: system clock, default staleness.
    pub fn new(
        source: Arc<dyn SheetSource>,
        configs: Vec<DatasetConfig>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(source, Arc::new(SystemClock), configs, DEFAULT_STALENESS)
    }

    pub fn with_clock(
        source: Arc<dyn SheetSource>,
        clock: Arc<dyn Clock>,
        configs: Vec<DatasetConfig>,
        staleness: Duration,
    ) -> Result<Self, ConfigError> {
        let mut datasets = HashMap::new();
        for config in configs {
            let config = Arc::new(config);
            let extractor = RecordExtractor::new(Arc::clone(&config))?;
            datasets.insert(
                config.kind,
                DatasetState {
                    config,
                    extractor,
                    slot: RwLock::new(CacheSlot::empty()),
                    refresh_lock: Mutex::new(()),
                },
            );
        }

        let staleness = chrono::Duration::from_std(staleness)
            .unwrap_or_else(|_| chrono::Duration::days(36_500));

        Ok(Self {
            datasets,
            source,
            clock,
            staleness,
        })
    }

    /// Current batch for a dataset. The first read pays for the initial
    /// extraction; a stale batch is re-extracted before returning.
    pub fn get(&self, kind: RecordKind) -> Vec<SubmittalRecord> {
        let Some(state) = self.datasets.get(&kind) else {
            log::warn!("get: no dataset configured for {}", kind);
            return Vec::new();
        };

        if !self.is_fresh(state) {
            self.run_refresh(state, kind, false);
        }

        read_slot(state).records.as_ref().clone()
    }

    /// Re-runs extraction regardless of staleness. Used after an upload.
    pub fn force_refresh(&self, kind: RecordKind) -> RefreshSummary {
        let Some(state) = self.datasets.get(&kind) else {
            log::warn!("force_refresh: no dataset configured for {}", kind);
            return RefreshSummary {
                record_count: 0,
                diagnostic_count: 0,
            };
        };

        self.run_refresh(state, kind, true);

        let slot = read_slot(state);
        RefreshSummary {
            record_count: slot.records.len(),
            diagnostic_count: slot.diagnostics.len(),
        }
    }

    /// Record count per canonical status, for dashboard summary tiles.
    pub fn status_counts(&self, kind: RecordKind) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in self.get(kind) {
            *counts
                .entry(record.current_status.as_str().to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// Warnings and errors from the most recent refresh attempt.
    pub fn diagnostics(&self, kind: RecordKind) -> Vec<Diagnostic> {
        let Some(state) = self.datasets.get(&kind) else {
            log::warn!("diagnostics: no dataset configured for {}", kind);
            return Vec::new();
        };

        read_slot(state).diagnostics.as_ref().clone()
    }

    fn is_fresh(&self, state: &DatasetState) -> bool {
        let slot = read_slot(state);
        match slot.refreshed_at {
            Some(at) => self.clock.now() - at < self.staleness,
            None => false,
        }
    }

    fn run_refresh(&self, state: &DatasetState, kind: RecordKind, force: bool) {
        let observed = read_slot(state).generation;

        let _guard = match state.refresh_lock.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Refresh lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        // Coalesce: a refresh that completed while this caller waited for
        // the lock already did the work, forced or not.
        if read_slot(state).generation != observed {
            return;
        }
        if !force && self.is_fresh(state) {
            return;
        }

        let _span = info_span!("refresh", dataset = kind.label(), force).entered();
        let started = self.clock.now();
        let outcome = self.run_extraction(state, kind);

        let mut slot = write_slot(state);
        slot.generation += 1;
        slot.refreshed_at = Some(started);
        match outcome {
            Ok(result) => {
                log::info!(
                    "Refreshed {}: {} records, {} diagnostics",
                    kind,
                    result.records.len(),
                    result.diagnostics.len()
                );
                slot.records = Arc::new(result.records);
                slot.diagnostics = Arc::new(result.diagnostics);
            }
            Err(e) => {
                // Previous records stay authoritative; the failure is
                // visible through diagnostics() instead of the read path.
                log::error!("Refresh failed for {}: {}", kind, e);
                slot.diagnostics = Arc::new(vec![Diagnostic::error(None, e.to_string())]);
            }
        }
    }

    fn run_extraction(
        &self,
        state: &DatasetState,
        kind: RecordKind,
    ) -> crate::error::Result<ExtractionResult> {
        let bytes = self.source.read(kind)?;
        let sheet = decode_workbook(&bytes, state.config.sheet_name.as_deref())?;
        let result = state.extractor.extract(&sheet, self.clock.now())?;
        Ok(result)
    }
}

fn read_slot(state: &DatasetState) -> RwLockReadGuard<'_, CacheSlot> {
    match state.slot.read() {
        Ok(g) => g,
        Err(poisoned) => {
            log::warn!("Cache slot lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write_slot(state: &DatasetState) -> RwLockWriteGuard<'_, CacheSlot> {
    match state.slot.write() {
        Ok(g) => g,
        Err(poisoned) => {
            log::warn!("Cache slot lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
