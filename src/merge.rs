use crate::schema::{Dataset, SalesRecord};
use crate::utils::{canonical_month_label, fold_text};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a freshly parsed upload is folded into the existing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[schemars(
        description = "Concatenate unconditionally. Re-uploading the same file duplicates its rows."
    )]
    Append,

    #[schemars(
        description = "Drop every existing record whose month appears in the upload, then append the upload. Re-uploading a month replaces it."
    )]
    #[default]
    ReplaceByMonth,

    #[schemars(
        description = "Append only records whose normalized (month, branch, category, seller, amount, quantity) tuple is not already present."
    )]
    FingerprintDedupe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub removed: usize,
    pub skipped_duplicates: usize,
}

impl MergePolicy {
    pub fn apply(&self, dataset: &mut Dataset, batch: Vec<SalesRecord>) -> MergeOutcome {
        let outcome = match self {
            MergePolicy::Append => append(dataset, batch),
            MergePolicy::ReplaceByMonth => replace_by_month(dataset, batch),
            MergePolicy::FingerprintDedupe => fingerprint_dedupe(dataset, batch),
        };

        debug!(
            "Merged upload with {:?}: {} added, {} removed, {} duplicates skipped",
            self, outcome.added, outcome.removed, outcome.skipped_duplicates
        );

        outcome
    }
}

/// Case- and whitespace-insensitive identity of a record.
pub fn fingerprint(record: &SalesRecord) -> String {
    [
        month_identity(&record.month),
        fold_text(&record.branch),
        fold_text(&record.category),
        fold_text(&record.seller),
        record.amount.to_string(),
        record.quantity.to_string(),
    ]
    .join("|")
}

// "octubre-2025" and "Octubre 2025" name the same month.
fn month_identity(label: &str) -> String {
    fold_text(&canonical_month_label(label))
}

fn append(dataset: &mut Dataset, batch: Vec<SalesRecord>) -> MergeOutcome {
    let added = batch.len();
    dataset.records_mut().extend(batch);
    MergeOutcome {
        added,
        ..MergeOutcome::default()
    }
}

fn replace_by_month(dataset: &mut Dataset, batch: Vec<SalesRecord>) -> MergeOutcome {
    let months: HashSet<String> = batch.iter().map(|r| month_identity(&r.month)).collect();

    let records = dataset.records_mut();
    let before = records.len();
    records.retain(|r| !months.contains(&month_identity(&r.month)));
    let removed = before - records.len();

    let added = batch.len();
    records.extend(batch);

    MergeOutcome {
        added,
        removed,
        skipped_duplicates: 0,
    }
}

fn fingerprint_dedupe(dataset: &mut Dataset, batch: Vec<SalesRecord>) -> MergeOutcome {
    let mut seen: HashSet<String> = dataset.iter().map(fingerprint).collect();
    let mut outcome = MergeOutcome::default();

    for record in batch {
        if seen.insert(fingerprint(&record)) {
            dataset.records_mut().push(record);
            outcome.added += 1;
        } else {
            outcome.skipped_duplicates += 1;
        }
    }

    outcome
}
