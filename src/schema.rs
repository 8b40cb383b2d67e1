use crate::utils::{sort_month_labels, MonthKey};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Largest unit count a single row may carry; anything above reads as 0.
pub const MAX_QUANTITY: u64 = 1_000_000_000;

/// Clamps a numeric unit count: non-finite, non-positive or out-of-range
/// values become 0, everything else is rounded.
pub fn quantity_from_number(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded > MAX_QUANTITY as f64 {
        0
    } else {
        rounded as u64
    }
}

// Older stored datasets may hold fractional or null counts.
fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(quantity_from_number).unwrap_or(0))
}

/// One row of a CRM sales export after normalization.
///
/// Field names on the wire match the keys the dashboard has always persisted,
/// so previously stored datasets keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SalesRecord {
    #[serde(rename = "mes", alias = "month")]
    #[schemars(description = "Month label, canonicalized when recognizable (e.g. \"Octubre 2025\")")]
    pub month: String,

    #[serde(rename = "sucursal", alias = "branch")]
    #[schemars(description = "Physical business location (e.g. \"Buenavista\", \"Masaryk\")")]
    pub branch: String,

    #[serde(rename = "linea", alias = "category")]
    #[schemars(description = "Product or service line")]
    pub category: String,

    #[serde(rename = "vendedora", alias = "seller", default)]
    #[schemars(description = "Salesperson name; may be empty")]
    pub seller: String,

    #[serde(rename = "precioTotal", alias = "amount")]
    #[schemars(description = "Monetary total for the row, always greater than zero")]
    pub amount: f64,

    #[serde(
        rename = "cantidad",
        alias = "quantity",
        default,
        deserialize_with = "lenient_quantity"
    )]
    #[schemars(with = "u64", description = "Unit count")]
    pub quantity: u64,
}

impl SalesRecord {
    pub fn new(
        month: impl Into<String>,
        branch: impl Into<String>,
        category: impl Into<String>,
        seller: impl Into<String>,
        amount: f64,
        quantity: u64,
    ) -> Self {
        Self {
            month: month.into(),
            branch: branch.into(),
            category: category.into(),
            seller: seller.into(),
            amount,
            quantity,
        }
    }

    /// A record belongs in a dataset only with a positive amount and a
    /// non-empty month, branch and category.
    pub fn is_admissible(&self) -> bool {
        self.amount > 0.0
            && !self.month.trim().is_empty()
            && !self.branch.trim().is_empty()
            && !self.category.trim().is_empty()
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey::parse(&self.month)
    }
}

/// Insertion-ordered collection of sales records owned by a dashboard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<SalesRecord> {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<SalesRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    /// Distinct month labels present, sorted chronologically.
    pub fn months(&self) -> Vec<String> {
        sort_month_labels(self.records.iter().map(|r| r.month.as_str()))
    }

    pub fn total_revenue(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Dataset)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Branch restriction applied on top of the month filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum BranchFilter {
    #[default]
    All,
    Only(String),
}

impl BranchFilter {
    /// Maps a selector label to a filter; the configured "all" label (e.g. "Todas")
    /// and the empty string both mean every branch.
    pub fn from_label(label: &str, all_label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(all_label.trim()) {
            BranchFilter::All
        } else {
            BranchFilter::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        match self {
            BranchFilter::All => true,
            BranchFilter::Only(branch) => record.branch == *branch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum BreakdownDimension {
    Category,
    Seller,
}

impl BreakdownDimension {
    pub fn key<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            BreakdownDimension::Category => &record.category,
            BreakdownDimension::Seller => &record.seller,
        }
    }
}

/// A single category or seller selected for trend analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrendSubject {
    pub dimension: BreakdownDimension,
    pub name: String,
}

impl TrendSubject {
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            dimension: BreakdownDimension::Category,
            name: name.into(),
        }
    }

    pub fn seller(name: impl Into<String>) -> Self {
        Self {
            dimension: BreakdownDimension::Seller,
            name: name.into(),
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.dimension.key(record) == self.name
    }
}
