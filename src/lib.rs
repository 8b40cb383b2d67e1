//! # Sales Dashboard
//!
//! A library for turning CRM sales exports (CSV) into a persisted monthly dataset
//! and the KPI, evolution and breakdown figures a sales dashboard renders.
//!
//! ## Core Concepts
//!
//! - **Sales Record**: One normalized export row (month, branch, category, seller, amount, quantity)
//! - **Dataset**: The insertion-ordered records a session owns, seeded from baseline data
//! - **Ingestion**: Header aliasing, locale number parsing and row admission for uploads
//! - **Merge Policy**: How an upload is folded into the dataset (replace-by-month by default)
//! - **Month Key**: Sortable `YYYY-MM` derived from Spanish month labels; unknown labels sort last
//! - **No Basis**: Growth ratios without a positive denominator are `None`, never `0`
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_dashboard::*;
//!
//! let mut session = DashboardSession::open(
//!     DashboardConfig::default(),
//!     MemoryStore::new(DEFAULT_STORAGE_KEY),
//! )?;
//!
//! let report = session.ingest_path("ventas_enero_2026.csv")?;
//! println!("{} records added", report.merge.added);
//!
//! let snapshot = session
//!     .snapshot(None, "Todas", &DashboardTab::default())
//!     .expect("dataset is never empty after a successful upload");
//! println!("Growth: {}", format_percent(snapshot.kpis.growth_percent));
//! ```

pub mod analytics;
pub mod baseline;
pub mod config;
pub mod error;
pub mod format;
pub mod ingestion;
pub mod merge;
pub mod schema;
pub mod session;
pub mod store;
pub mod utils;

pub use analytics::{
    percent_change, BreakdownEntry, DashboardSnapshot, DashboardTab, EvolutionPoint, Filters,
    KpiSummary, SalesAnalyzer, TrendAnalysis,
};
pub use baseline::{baseline_dataset, BASELINE_MONTH};
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use format::*;
pub use ingestion::{parse_delimited, CanonicalField, CsvIngestor, HeaderMap, IngestOutcome};
pub use merge::{fingerprint, MergeOutcome, MergePolicy};
pub use schema::*;
pub use session::{DashboardSession, IngestReport};
pub use store::{DatasetStore, JsonFileStore, MemoryStore, DEFAULT_STORAGE_KEY};
pub use utils::*;

use log::debug;

/// Computes a full dashboard render for an explicit selection.
pub fn dashboard_snapshot(
    dataset: &Dataset,
    filters: &Filters,
    tab: &DashboardTab,
) -> DashboardSnapshot {
    debug!(
        "Building snapshot over {} records for {} / {:?}",
        dataset.len(),
        filters.month,
        filters.branch
    );
    SalesAnalyzer::new(dataset).snapshot(filters, tab)
}

/// Parses `contents` and merges the admitted rows into `dataset` with `policy`.
/// On error the dataset is not touched.
pub fn ingest_into(
    dataset: &mut Dataset,
    contents: &[u8],
    policy: MergePolicy,
) -> Result<MergeOutcome> {
    let records = parse_delimited(contents)?;
    Ok(policy.apply(dataset, records))
}
