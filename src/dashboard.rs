//! Dashboard state: the current dataset, the active filter and the
//! loading/error status, owned by a single coordinator.

use crate::analyzer::{self, AdmissionAnalyzer, DashboardView};
use crate::error::{DashboardError, Result};
use crate::models::{AdmissionRecord, FilterState, RegionFilter};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Last ingestion failed; the previous dataset is still shown
    Failed(String),
}

/// Which records the AI report summarizes. The whole dataset unless the
/// caller asks for the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportScope {
    Filtered,
    #[default]
    Dataset,
}

impl ReportScope {
    pub fn from_filtered_flag(filtered: bool) -> Self {
        if filtered {
            ReportScope::Filtered
        } else {
            ReportScope::Dataset
        }
    }
}

/// Runs one ingestion at a time with a timeout and a cancel path.
///
/// `ingest` takes `&self`, so one `Ingestor` can be shared by several
/// callers; the in-flight flag rejects a second ingestion while one runs.
/// [`Dashboard::refresh`] already serializes through `&mut self`.
pub struct Ingestor {
    in_flight: AtomicBool,
    timeout: Duration,
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Ingestor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            timeout,
        }
    }

    fn try_acquire(&self) -> Result<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DashboardError::IngestionInProgress)?;
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    pub async fn ingest<F>(
        &self,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<AdmissionRecord>>
    where
        F: Future<Output = Result<Vec<AdmissionRecord>>>,
    {
        let _guard = self.try_acquire()?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DashboardError::Cancelled),
            result = tokio::time::timeout(self.timeout, fetch) => {
                result.unwrap_or(Err(DashboardError::Timeout(self.timeout)))
            }
        }
    }
}

/// Puts the pre-refresh state back when a refresh ends, including when the
/// refresh future is dropped mid-await.
struct RestoreOnDrop<'a> {
    state: &'a mut LoadState,
    previous: LoadState,
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        *self.state = std::mem::take(&mut self.previous);
    }
}

pub struct Dashboard {
    records: Arc<[AdmissionRecord]>,
    region_options: Vec<String>,
    filter: FilterState,
    load_state: LoadState,
    ingestor: Ingestor,
}

impl Dashboard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            records: Arc::from(Vec::new()),
            region_options: analyzer::region_options(&[]),
            filter: FilterState::default(),
            load_state: LoadState::Idle,
            ingestor: Ingestor::new(timeout),
        }
    }

    pub fn records(&self) -> &[AdmissionRecord] {
        &self.records
    }

    pub fn region_options(&self) -> &[String] {
        &self.region_options
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_region(&mut self, region: RegionFilter) {
        self.filter.region = region;
    }

    pub fn view(&self) -> DashboardView {
        AdmissionAnalyzer::new(&self.records).analyze(&self.filter)
    }

    pub fn report_records(&self, scope: ReportScope) -> Vec<AdmissionRecord> {
        match scope {
            ReportScope::Filtered => self.view().filtered,
            ReportScope::Dataset => self.records.to_vec(),
        }
    }

    /// Load a fresh dataset. On failure the current records stay in place
    /// and the error is kept in [`LoadState::Failed`].
    pub async fn refresh<F>(&mut self, fetch: F, cancel: &CancellationToken) -> Result<usize>
    where
        F: Future<Output = Result<Vec<AdmissionRecord>>>,
    {
        let previous = std::mem::replace(&mut self.load_state, LoadState::Loading);
        let result = {
            let _restore = RestoreOnDrop {
                state: &mut self.load_state,
                previous,
            };
            self.ingestor.ingest(fetch, cancel).await
        };
        self.apply_ingestion(result)
    }

    fn apply_ingestion(&mut self, result: Result<Vec<AdmissionRecord>>) -> Result<usize> {
        match result {
            Ok(records) => {
                let count = records.len();
                self.replace_records(records);
                info!(records = count, "dataset loaded");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, kept = self.records.len(), "ingestion failed");
                self.load_state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Swap in a whole new dataset; region options follow the dataset.
    pub fn replace_records(&mut self, records: Vec<AdmissionRecord>) {
        self.region_options = analyzer::region_options(&records);
        self.records = Arc::from(records);
        self.load_state = LoadState::Ready;
    }
}
