//! Pure projections from a [`Dataset`] and a set of filters to dashboard view models.
//!
//! Nothing in here mutates the dataset or remembers a selection: callers pass the
//! active month, branch and tab on every call and get fresh values back.

use crate::schema::{BranchFilter, BreakdownDimension, Dataset, SalesRecord, TrendSubject};
use crate::utils::{month_abbreviation, sort_month_labels};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NO_DATA_LABEL: &str = "Sin datos";

/// Active month plus branch restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub month: String,
    pub branch: BranchFilter,
}

impl Filters {
    pub fn new(month: impl Into<String>, branch: BranchFilter) -> Self {
        Self {
            month: month.into(),
            branch,
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        record.month == self.month && self.branch.matches(record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub previous_revenue: f64,
    /// Sum of `quantity` over the filtered view.
    pub transaction_count: u64,
    pub average_ticket: f64,
    /// `None` when the previous period is missing or sums to zero.
    pub growth_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub month: String,
    /// Axis label, e.g. "Oct".
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub total: f64,
    /// Relative to the largest group, for bar widths.
    pub percent_of_max: f64,
    /// Relative to the sum of all groups.
    pub share_of_total: f64,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub subject: TrendSubject,
    pub series: Vec<EvolutionPoint>,
    pub average: f64,
    pub best_month: Option<String>,
    pub worst_month: Option<String>,
    /// First-to-last month change; `None` when the first month has no sales.
    pub trend_percent: Option<f64>,
}

/// Which breakdown tab is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardTab {
    Breakdown(BreakdownDimension),
    Trend(TrendSubject),
}

impl Default for DashboardTab {
    fn default() -> Self {
        DashboardTab::Breakdown(BreakdownDimension::Category)
    }
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub months: Vec<String>,
    pub filters: Filters,
    pub kpis: KpiSummary,
    pub evolution: Vec<EvolutionPoint>,
    pub breakdown: Vec<BreakdownEntry>,
    pub trend: Option<TrendAnalysis>,
}

/// Read-only view over a dataset with its chronologically sorted month list.
pub struct SalesAnalyzer<'a> {
    records: &'a [SalesRecord],
    months: Vec<String>,
    no_data_label: String,
}

impl<'a> SalesAnalyzer<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::from_records(dataset.records())
    }

    pub fn from_records(records: &'a [SalesRecord]) -> Self {
        Self {
            records,
            months: sort_month_labels(records.iter().map(|r| r.month.as_str())),
            no_data_label: DEFAULT_NO_DATA_LABEL.to_string(),
        }
    }

    /// Label for the breakdown bucket that collects empty group keys.
    pub fn with_no_data_label(mut self, label: impl Into<String>) -> Self {
        self.no_data_label = label.into();
        self
    }

    pub fn months(&self) -> &[String] {
        &self.months
    }

    /// Keeps `requested` if it is still present, otherwise falls back to the latest month.
    pub fn resolve_month(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(month) if self.months.iter().any(|m| m == month) => Some(month.to_string()),
            _ => self.months.last().cloned(),
        }
    }

    /// The month immediately before `month` among the months present in the dataset.
    /// This is not calendar arithmetic: gaps in the data are skipped over.
    pub fn previous_month(&self, month: &str) -> Option<&str> {
        let idx = self.months.iter().position(|m| m == month)?;
        if idx == 0 {
            return None;
        }
        self.months.get(idx - 1).map(String::as_str)
    }

    pub fn filtered_view(&self, filters: &Filters) -> Vec<&'a SalesRecord> {
        self.records.iter().filter(|r| filters.matches(*r)).collect()
    }

    pub fn previous_period_view(&self, filters: &Filters) -> Vec<&'a SalesRecord> {
        match self.previous_month(&filters.month) {
            Some(previous) => {
                let previous_filters = Filters::new(previous, filters.branch.clone());
                self.filtered_view(&previous_filters)
            }
            None => Vec::new(),
        }
    }

    pub fn kpi_summary(&self, filters: &Filters) -> KpiSummary {
        let current = self.filtered_view(filters);
        let previous = self.previous_period_view(filters);

        let total_revenue = sum_amount(&current);
        let previous_revenue = sum_amount(&previous);
        let transaction_count = current
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.quantity));

        let average_ticket = if transaction_count > 0 {
            total_revenue / transaction_count as f64
        } else {
            0.0
        };

        KpiSummary {
            total_revenue,
            previous_revenue,
            transaction_count,
            average_ticket,
            growth_percent: percent_change(previous_revenue, total_revenue),
        }
    }

    /// One point per month in the dataset, independent of the selected month.
    pub fn evolution_series(&self, branch: &BranchFilter) -> Vec<EvolutionPoint> {
        self.series_where(|r| branch.matches(r))
    }

    pub fn breakdown(&self, filters: &Filters, dimension: BreakdownDimension) -> Vec<BreakdownEntry> {
        let mut groups: Vec<(String, f64, usize)> = Vec::new();

        for record in self.filtered_view(filters) {
            let key = match dimension.key(record) {
                "" => self.no_data_label.as_str(),
                key => key,
            };
            match groups.iter_mut().find(|(name, _, _)| name == key) {
                Some(group) => {
                    group.1 += record.amount;
                    group.2 += 1;
                }
                None => groups.push((key.to_string(), record.amount, 1)),
            }
        }

        // Stable sort keeps first-seen order among equal totals.
        groups.sort_by(|a, b| b.1.total_cmp(&a.1));

        let max = groups.first().map(|g| g.1).unwrap_or(0.0);
        let sum: f64 = groups.iter().map(|g| g.1).sum();

        groups
            .into_iter()
            .map(|(name, total, records)| BreakdownEntry {
                name,
                total,
                percent_of_max: ratio_percent(total, max),
                share_of_total: ratio_percent(total, sum),
                records,
            })
            .collect()
    }

    /// Distinct non-empty values of `dimension` under the branch filter, sorted by name.
    pub fn entities(&self, branch: &BranchFilter, dimension: BreakdownDimension) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .filter(|r| branch.matches(r))
            .map(|r| dimension.key(r))
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn trend_analysis(&self, branch: &BranchFilter, subject: &TrendSubject) -> TrendAnalysis {
        let series = self.series_where(|r| branch.matches(r) && subject.matches(r));

        let average = if series.is_empty() {
            0.0
        } else {
            series.iter().map(|p| p.total).sum::<f64>() / series.len() as f64
        };

        let mut best: Option<&EvolutionPoint> = None;
        let mut worst: Option<&EvolutionPoint> = None;
        for point in &series {
            if best.map_or(true, |b| point.total > b.total) {
                best = Some(point);
            }
            if worst.map_or(true, |w| point.total < w.total) {
                worst = Some(point);
            }
        }

        let trend_percent = match (series.first(), series.last()) {
            (Some(first), Some(last)) => percent_change(first.total, last.total),
            _ => None,
        };

        TrendAnalysis {
            subject: subject.clone(),
            best_month: best.map(|p| p.month.clone()),
            worst_month: worst.map(|p| p.month.clone()),
            average,
            trend_percent,
            series,
        }
    }

    pub fn snapshot(&self, filters: &Filters, tab: &DashboardTab) -> DashboardSnapshot {
        let (breakdown, trend) = match tab {
            DashboardTab::Breakdown(dimension) => (self.breakdown(filters, *dimension), None),
            DashboardTab::Trend(subject) => (
                self.breakdown(filters, subject.dimension),
                Some(self.trend_analysis(&filters.branch, subject)),
            ),
        };

        DashboardSnapshot {
            months: self.months.clone(),
            filters: filters.clone(),
            kpis: self.kpi_summary(filters),
            evolution: self.evolution_series(&filters.branch),
            breakdown,
            trend,
        }
    }

    fn series_where<F>(&self, predicate: F) -> Vec<EvolutionPoint>
    where
        F: Fn(&SalesRecord) -> bool,
    {
        self.months
            .iter()
            .map(|month| EvolutionPoint {
                month: month.clone(),
                label: month_abbreviation(month),
                total: self
                    .records
                    .iter()
                    .filter(|r| r.month == *month && predicate(*r))
                    .map(|r| r.amount)
                    .sum(),
            })
            .collect()
    }
}

fn sum_amount(records: &[&SalesRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// `(current - base) / base * 100`, or `None` when there is no positive base.
pub fn percent_change(base: f64, current: f64) -> Option<f64> {
    if base > 0.0 {
        Some((current - base) / base * 100.0)
    } else {
        None
    }
}

fn ratio_percent(value: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        value / denominator * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(month: &str, branch: &str, category: &str, seller: &str, amount: f64, qty: u64) -> SalesRecord {
        SalesRecord::new(month, branch, category, seller, amount, qty)
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            rec("Octubre 2025", "Buenavista", "Laser", "Ana", 300_000.0, 10),
            rec("Octubre 2025", "Masaryk", "Farmacia", "Eva", 200_000.0, 5),
            rec("Noviembre 2025", "Masaryk", "Laser", "Eva", 100_000.0, 4),
            rec("Enero 2026", "Buenavista", "Laser", "Ana", 450_000.0, 9),
            rec("Enero 2026", "Masaryk", "Farmacia", "", 150_000.0, 0),
        ])
    }

    #[test]
    fn test_months_sorted_and_resolved() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        assert_eq!(
            analyzer.months(),
            &["Octubre 2025", "Noviembre 2025", "Enero 2026"]
        );
        assert_eq!(
            analyzer.resolve_month(Some("Noviembre 2025")).as_deref(),
            Some("Noviembre 2025")
        );
        assert_eq!(
            analyzer.resolve_month(Some("Marzo 2024")).as_deref(),
            Some("Enero 2026")
        );
        assert_eq!(analyzer.resolve_month(None).as_deref(), Some("Enero 2026"));
    }

    #[test]
    fn test_previous_month_skips_gaps() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        assert_eq!(analyzer.previous_month("Enero 2026"), Some("Noviembre 2025"));
        assert_eq!(analyzer.previous_month("Octubre 2025"), None);
        assert_eq!(analyzer.previous_month("Marzo 2024"), None);
    }

    #[test]
    fn test_kpi_summary() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let kpis = analyzer.kpi_summary(&Filters::new("Enero 2026", BranchFilter::All));

        assert_eq!(kpis.total_revenue, 600_000.0);
        assert_eq!(kpis.previous_revenue, 100_000.0);
        assert_eq!(kpis.transaction_count, 9);
        assert!((kpis.average_ticket - 600_000.0 / 9.0).abs() < 1e-9);
        assert_eq!(kpis.growth_percent, Some(500.0));
    }

    #[test]
    fn test_growth_is_none_without_previous_revenue() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);

        let earliest = analyzer.kpi_summary(&Filters::new("Octubre 2025", BranchFilter::All));
        assert_eq!(earliest.growth_percent, None);

        // Buenavista sold nothing in Noviembre, so Enero has no basis for that branch.
        let branch = BranchFilter::Only("Buenavista".to_string());
        let kpis = analyzer.kpi_summary(&Filters::new("Enero 2026", branch));
        assert_eq!(kpis.previous_revenue, 0.0);
        assert_eq!(kpis.growth_percent, None);
    }

    #[test]
    fn test_transaction_count_saturates() {
        let dataset = Dataset::from_records(vec![
            rec("Enero 2026", "Masaryk", "Laser", "Ana", 100.0, u64::MAX),
            rec("Enero 2026", "Masaryk", "Laser", "Ana", 100.0, 1),
        ]);
        let kpis = SalesAnalyzer::new(&dataset)
            .kpi_summary(&Filters::new("Enero 2026", BranchFilter::All));
        assert_eq!(kpis.transaction_count, u64::MAX);
    }

    #[test]
    fn test_average_ticket_zero_without_transactions() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let branch = BranchFilter::Only("Masaryk".to_string());
        let kpis = analyzer.kpi_summary(&Filters::new("Enero 2026", branch));
        assert_eq!(kpis.transaction_count, 0);
        assert_eq!(kpis.average_ticket, 0.0);
    }

    #[test]
    fn test_evolution_series_ignores_selected_month() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let series = analyzer.evolution_series(&BranchFilter::Only("Masaryk".to_string()));

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].label, "Oct");
        assert_eq!(series[0].total, 200_000.0);
        assert_eq!(series[1].total, 100_000.0);
        assert_eq!(series[2].month, "Enero 2026");
        assert_eq!(series[2].total, 150_000.0);
    }

    #[test]
    fn test_breakdown_percent_of_max() {
        let dataset = Dataset::from_records(vec![
            rec("Enero 2026", "Masaryk", "B", "Ana", 200.0, 1),
            rec("Enero 2026", "Masaryk", "C", "Ana", 100.0, 1),
            rec("Enero 2026", "Masaryk", "A", "Ana", 300.0, 1),
        ]);
        let analyzer = SalesAnalyzer::new(&dataset);
        let entries = analyzer.breakdown(
            &Filters::new("Enero 2026", BranchFilter::All),
            BreakdownDimension::Category,
        );

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!((entries[0].percent_of_max - 100.0).abs() < 1e-9);
        assert!((entries[1].percent_of_max - 66.666_666).abs() < 1e-3);
        assert!((entries[2].percent_of_max - 33.333_333).abs() < 1e-3);
        assert!((entries[0].share_of_total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_empty_key_goes_to_no_data_bucket() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset).with_no_data_label("(vacío)");
        let entries = analyzer.breakdown(
            &Filters::new("Enero 2026", BranchFilter::All),
            BreakdownDimension::Seller,
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Ana");
        assert_eq!(entries[1].name, "(vacío)");
        assert_eq!(entries[1].records, 1);
    }

    #[test]
    fn test_breakdown_of_empty_view() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let entries = analyzer.breakdown(
            &Filters::new("Marzo 2024", BranchFilter::All),
            BreakdownDimension::Category,
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn test_trend_analysis() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let trend = analyzer.trend_analysis(&BranchFilter::All, &TrendSubject::category("Laser"));

        let totals: Vec<f64> = trend.series.iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![300_000.0, 100_000.0, 450_000.0]);
        assert!((trend.average - 850_000.0 / 3.0).abs() < 1e-6);
        assert_eq!(trend.best_month.as_deref(), Some("Enero 2026"));
        assert_eq!(trend.worst_month.as_deref(), Some("Noviembre 2025"));
        assert_eq!(trend.trend_percent, Some(50.0));
    }

    #[test]
    fn test_trend_ties_and_missing_basis() {
        let dataset = Dataset::from_records(vec![
            rec("Octubre 2025", "Masaryk", "Laser", "Ana", 100.0, 1),
            rec("Noviembre 2025", "Masaryk", "Laser", "Eva", 100.0, 1),
            rec("Diciembre 2025", "Masaryk", "Laser", "Eva", 100.0, 1),
        ]);
        let analyzer = SalesAnalyzer::new(&dataset);

        let trend = analyzer.trend_analysis(&BranchFilter::All, &TrendSubject::category("Laser"));
        assert_eq!(trend.best_month.as_deref(), Some("Octubre 2025"));
        assert_eq!(trend.worst_month.as_deref(), Some("Octubre 2025"));
        assert_eq!(trend.trend_percent, Some(0.0));

        let eva = analyzer.trend_analysis(&BranchFilter::All, &TrendSubject::seller("Eva"));
        assert_eq!(eva.series[0].total, 0.0);
        assert_eq!(eva.worst_month.as_deref(), Some("Octubre 2025"));
        assert_eq!(eva.trend_percent, None);
    }

    #[test]
    fn test_entities() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        assert_eq!(
            analyzer.entities(&BranchFilter::All, BreakdownDimension::Seller),
            vec!["Ana", "Eva"]
        );
        assert_eq!(
            analyzer.entities(
                &BranchFilter::Only("Masaryk".to_string()),
                BreakdownDimension::Category
            ),
            vec!["Farmacia", "Laser"]
        );
    }

    #[test]
    fn test_snapshot_with_trend_tab() {
        let dataset = sample();
        let analyzer = SalesAnalyzer::new(&dataset);
        let filters = Filters::new("Octubre 2025", BranchFilter::All);
        let snapshot = analyzer.snapshot(&filters, &DashboardTab::Trend(TrendSubject::seller("Ana")));

        assert_eq!(snapshot.months.len(), 3);
        assert_eq!(snapshot.evolution.len(), 3);
        assert_eq!(snapshot.kpis.total_revenue, 500_000.0);
        assert_eq!(snapshot.breakdown[0].name, "Ana");
        assert!(snapshot.trend.is_some());
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(200.0, 150.0), Some(-25.0));
    }
}
