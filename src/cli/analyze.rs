use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::charts::write_charts;
use crate::cli::text;
use crate::cli::ClusterArgs;
use crate::error::Result;
use crate::export::export_to_path;
use crate::pipeline::analyze_path;
use crate::reports::build_report;
use crate::settings::Settings;

pub fn run(
    file: &Path,
    cluster: &ClusterArgs,
    export: Option<PathBuf>,
    charts: Option<PathBuf>,
    limit: Option<usize>,
    settings: &Settings,
) -> Result<()> {
    let analysis = analyze_path(file, &settings.keyword_table(), &cluster.params(settings))?;
    let rows = &analysis.table.rows;
    let report = build_report(rows, settings.top_merchants);

    println!("{}", "Categorized Transactions".bold());
    println!("{}", text::format_transactions(rows, limit));
    println!(
        "{} categorized, {} other",
        analysis.categorize.categorized, analysis.categorize.other
    );

    println!("\n{}", "Category Summary".bold());
    println!("{}", text::format_category_summary(&report));

    println!("\n{}", "Monthly Spending".bold());
    println!("{}", text::format_monthly(&report));

    println!("\n{}", format!("Top {} Merchants", settings.top_merchants).bold());
    println!("{}", text::format_top_merchants(&report));

    println!("\n{}", "Transaction Clusters".bold());
    println!("{}", text::format_clusters(&report.clusters, &analysis.model));

    if let Some(path) = export {
        export_to_path(&analysis.table, &path)?;
        println!("\nWrote {}", path.display());
    }
    if let Some(dir) = charts {
        let written = write_charts(&report, &dir)?;
        println!("\nWrote {} charts to {}", written.len(), dir.display());
    }
    Ok(())
}
