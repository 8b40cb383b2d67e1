use crate::analytics::{DashboardSnapshot, DashboardTab, Filters, SalesAnalyzer};
use crate::baseline::baseline_dataset;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::ingestion::{CsvIngestor, IngestOutcome};
use crate::merge::MergeOutcome;
use crate::schema::{Dataset, SalesRecord};
use crate::store::DatasetStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub merge: MergeOutcome,
    pub dataset_len: usize,
}

/// Single owner of the dataset for one dashboard session.
///
/// Every mutation goes through [`ingest_bytes`](Self::ingest_bytes) (and its
/// siblings) or [`reset`](Self::reset). Each is all-or-nothing: when parsing or
/// persisting fails the in-memory dataset is left exactly as it was.
pub struct DashboardSession<S: DatasetStore> {
    config: DashboardConfig,
    store: S,
    dataset: Dataset,
}

impl<S: DatasetStore> DashboardSession<S> {
    /// Rehydrates from `store`, falling back to baseline data when nothing usable is stored.
    pub fn open(config: DashboardConfig, store: S) -> Result<Self> {
        config.validate()?;
        if store.key() != config.storage_key {
            return Err(DashboardError::InvalidConfig(format!(
                "store key '{}' does not match storage_key '{}'",
                store.key(),
                config.storage_key
            )));
        }

        let dataset = match store.load() {
            Some(dataset) => {
                info!("Rehydrated {} persisted sales records", dataset.len());
                dataset
            }
            None => {
                info!("No usable persisted data, starting from baseline");
                baseline_dataset()
            }
        };

        Ok(Self {
            config,
            store,
            dataset,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn ingestor(&self) -> CsvIngestor {
        CsvIngestor::with_delimiter(self.config.delimiter_byte())
    }

    pub fn ingest_path(&mut self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let outcome = self.ingestor().parse_path(path)?;
        self.commit_upload(outcome)
    }

    pub fn ingest_bytes(&mut self, contents: &[u8]) -> Result<IngestReport> {
        let outcome = self.ingestor().parse_bytes(contents)?;
        self.commit_upload(outcome)
    }

    /// Merges already-normalized records with the configured policy and persists the result.
    /// Inadmissible records are dropped; `NoValidRows` when none is left.
    pub fn ingest_records(&mut self, records: Vec<SalesRecord>) -> Result<MergeOutcome> {
        let total = records.len();
        let records: Vec<SalesRecord> = records
            .into_iter()
            .filter(SalesRecord::is_admissible)
            .collect();
        if records.len() < total {
            warn!("Dropped {} inadmissible records", total - records.len());
        }
        if records.is_empty() {
            return Err(DashboardError::NoValidRows);
        }

        let mut next = self.dataset.clone();
        let merge = self.config.merge_policy.apply(&mut next, records);

        self.store.save(&next)?;
        self.dataset = next;
        Ok(merge)
    }

    fn commit_upload(&mut self, outcome: IngestOutcome) -> Result<IngestReport> {
        let IngestOutcome {
            records,
            rows_read,
            rows_skipped,
        } = outcome;

        let merge = self.ingest_records(records)?;
        info!(
            "Upload merged: {} rows read, {} skipped, dataset now has {} records",
            rows_read,
            rows_skipped,
            self.dataset.len()
        );

        Ok(IngestReport {
            rows_read,
            rows_skipped,
            merge,
            dataset_len: self.dataset.len(),
        })
    }

    /// Drops every uploaded record, restores baseline data and clears persisted state.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        self.dataset = baseline_dataset();
        info!("Dataset reset to baseline ({} records)", self.dataset.len());
        Ok(())
    }

    pub fn analyzer(&self) -> SalesAnalyzer<'_> {
        SalesAnalyzer::new(&self.dataset).with_no_data_label(self.config.no_data_label.clone())
    }

    pub fn months(&self) -> Vec<String> {
        self.dataset.months()
    }

    /// Turns raw selector values into filters. An unknown or absent month resolves
    /// to the latest available one; `None` only when the dataset is empty.
    pub fn filters(&self, month: Option<&str>, branch_label: &str) -> Option<Filters> {
        let month = self.analyzer().resolve_month(month)?;
        let branch = self.config.branch_filter(branch_label);
        debug!("Resolved filters: month={}, branch={:?}", month, branch);
        Some(Filters::new(month, branch))
    }

    pub fn snapshot(
        &self,
        month: Option<&str>,
        branch_label: &str,
        tab: &DashboardTab,
    ) -> Option<DashboardSnapshot> {
        let filters = self.filters(month, branch_label)?;
        Some(self.analyzer().snapshot(&filters, tab))
    }
}
