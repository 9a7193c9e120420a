use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::categorizer::KeywordTable;
use crate::cluster::ClusterModel;
use crate::fmt::{money, percent};
use crate::models::Transaction;
use crate::reports::{ClusterProfile, SpendingReport};

fn amount_cell(amount: f64) -> Cell {
    Cell::new(money(amount)).set_alignment(CellAlignment::Right)
}

pub fn format_transactions(rows: &[Transaction], limit: Option<usize>) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Category", "Cluster"]);
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    for row in &rows[..shown] {
        table.add_row(vec![
            Cell::new(row.date),
            Cell::new(&row.description),
            amount_cell(row.amount),
            Cell::new(row.category.map(|c| c.label()).unwrap_or("")),
            Cell::new(row.cluster.map(|c| c.to_string()).unwrap_or_default()),
        ]);
    }
    let mut out = table.to_string();
    if shown < rows.len() {
        out.push_str(&format!("\n… {} more", rows.len() - shown));
    }
    out
}

pub fn format_category_summary(report: &SpendingReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Total", "Count", "Share"]);
    for item in &report.categories {
        table.add_row(vec![
            Cell::new(item.category.label()),
            amount_cell(item.total),
            Cell::new(item.count),
            Cell::new(percent(item.total, report.total)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        amount_cell(report.total),
        Cell::new(report.count),
        Cell::new(""),
    ]);
    table.to_string()
}

pub fn format_monthly(report: &SpendingReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Total"]);
    for m in &report.months {
        table.add_row(vec![Cell::new(&m.month), amount_cell(m.total)]);
    }
    table.to_string()
}

pub fn format_top_merchants(report: &SpendingReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Total", "Count"]);
    for m in &report.merchants {
        table.add_row(vec![
            Cell::new(&m.description),
            amount_cell(m.total),
            Cell::new(m.count),
        ]);
    }
    table.to_string()
}

pub fn format_clusters(profiles: &[ClusterProfile], model: &ClusterModel) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Cluster", "Count", "Total", "Mean", "Mostly", "Centroid"]);
    for p in profiles {
        // Centroids live in standardized (merchant, amount) space.
        let centroid = (p.cluster < model.centroids.nrows())
            .then(|| {
                let c = model.centroids.row(p.cluster);
                format!("({:+.2}, {:+.2})", c[0], c[1])
            })
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(p.cluster),
            Cell::new(p.count),
            amount_cell(p.total),
            amount_cell(p.mean),
            Cell::new(p.dominant_category.map(|c| c.label()).unwrap_or("-")),
            Cell::new(centroid),
        ]);
    }
    let mut out = table.to_string();
    out.push_str(&format!(
        "\n{} clusters, within-cluster sum of squares {:.3}",
        model.n_clusters, model.inertia
    ));
    if model.is_reduced() {
        out.push_str(&format!(
            "\n{}",
            format!(
                "Only {} distinct transactions; asked for {} clusters.",
                model.n_clusters, model.requested_clusters
            )
            .yellow()
        ));
    }
    out
}

pub fn format_keywords(keywords: &KeywordTable) -> String {
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Keywords"]);
    for (i, rule) in keywords.rules().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.category.label()),
            Cell::new(rule.keywords.join(", ")),
        ]);
    }
    table.to_string()
}
