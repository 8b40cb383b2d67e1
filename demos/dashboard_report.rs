use sales_dashboard::{
    format_count, format_currency, format_percent, format_thousands_tick, month_button_label,
    BreakdownDimension, DashboardConfig, DashboardSession, DashboardTab, JsonFileStore,
    TrendSubject,
};
use std::env;

/// Usage: dashboard_report <data_dir> [upload.csv] [branch]
fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "dashboard_data".to_string());
    let upload = args.next();
    let config = DashboardConfig::default();
    let branch = args
        .next()
        .unwrap_or_else(|| config.all_branches_label.clone());

    let store = JsonFileStore::new(&data_dir, &config.storage_key);
    let mut session = DashboardSession::open(config, store)?;

    if let Some(path) = upload {
        match session.ingest_path(&path) {
            Ok(report) => println!(
                "Loaded {}: {} rows read, {} skipped, {} added, {} replaced",
                path, report.rows_read, report.rows_skipped, report.merge.added, report.merge.removed
            ),
            Err(e) => println!("Upload rejected, data unchanged: {}", e),
        }
    }

    let months: Vec<String> = session
        .months()
        .iter()
        .map(|m| month_button_label(m))
        .collect();
    println!("Months: {}", months.join(" | "));
    println!("Branches: {}", session.config().branch_options().join(" | "));

    let Some(snapshot) = session.snapshot(None, &branch, &DashboardTab::default()) else {
        println!("No data to show.");
        return Ok(());
    };

    println!();
    println!("== {} / {} ==", snapshot.filters.month, branch);
    println!("Revenue:       {}", format_currency(snapshot.kpis.total_revenue, 0));
    println!("Growth:        {}", format_percent(snapshot.kpis.growth_percent));
    println!("Avg. ticket:   {}", format_currency(snapshot.kpis.average_ticket, 0));
    println!("Transactions:  {}", format_count(snapshot.kpis.transaction_count));

    println!();
    println!("Evolution:");
    for point in &snapshot.evolution {
        println!("  {:<4} {:>8}", point.label, format_thousands_tick(point.total));
    }

    println!();
    println!("By category:");
    for entry in &snapshot.breakdown {
        let bar = "#".repeat((entry.percent_of_max / 5.0).round() as usize);
        println!(
            "  {:<20} {:>12} {}",
            entry.name,
            format_currency(entry.total, 0),
            bar
        );
    }

    let filters = session
        .filters(Some(&snapshot.filters.month), &branch)
        .unwrap_or(snapshot.filters.clone());
    let analyzer = session.analyzer();
    if let Some(top_seller) = analyzer
        .breakdown(&filters, BreakdownDimension::Seller)
        .first()
    {
        let trend = analyzer.trend_analysis(&filters.branch, &TrendSubject::seller(&top_seller.name));
        println!();
        println!(
            "Top seller {}: average {}, best {}, worst {}, trend {}",
            top_seller.name,
            format_currency(trend.average, 0),
            trend.best_month.as_deref().unwrap_or("-"),
            trend.worst_month.as_deref().unwrap_or("-"),
            format_percent(trend.trend_percent)
        );
    }

    Ok(())
}
