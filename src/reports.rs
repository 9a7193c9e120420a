use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::categorizer::Category;
use crate::models::Transaction;

// ---------------------------------------------------------------------------
// Category summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// Sum of amounts per category, largest total first. Uncategorized rows are
/// skipped.
pub fn category_totals(rows: &[Transaction]) -> Vec<CategoryTotal> {
    let mut by_cat: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(category) = row.category else { continue };
        let entry = by_cat.entry(category).or_insert((0.0, 0));
        entry.0 += row.amount;
        entry.1 += 1;
    }
    let mut totals: Vec<CategoryTotal> = by_cat
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal { category, total, count })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

// ---------------------------------------------------------------------------
// Monthly spending
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
}

pub fn monthly_totals(rows: &[Transaction]) -> Vec<MonthTotal> {
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *by_month.entry(row.month()).or_insert(0.0) += row.amount;
    }
    by_month
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

// ---------------------------------------------------------------------------
// Top merchants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantTotal {
    pub description: String,
    pub total: f64,
    pub count: usize,
}

/// The `n` descriptions with the highest total spend. Equal totals order by
/// description.
pub fn top_merchants(rows: &[Transaction], n: usize) -> Vec<MerchantTotal> {
    let mut by_desc: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = by_desc.entry(row.description.as_str()).or_insert((0.0, 0));
        entry.0 += row.amount;
        entry.1 += 1;
    }
    let mut merchants: Vec<MerchantTotal> = by_desc
        .into_iter()
        .map(|(desc, (total, count))| MerchantTotal {
            description: desc.to_string(),
            total,
            count,
        })
        .collect();
    merchants.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.description.cmp(&b.description))
    });
    merchants.truncate(n);
    merchants
}

// ---------------------------------------------------------------------------
// Cumulative trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub daily: f64,
    pub cumulative: f64,
}

/// Daily sums in date order with a running total.
pub fn cumulative_trend(rows: &[Transaction]) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *by_date.entry(row.date).or_insert(0.0) += row.amount;
    }
    let mut running = 0.0;
    by_date
        .into_iter()
        .map(|(date, daily)| {
            running += daily;
            TrendPoint {
                date,
                daily,
                cumulative: running,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cluster profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub dominant_category: Option<Category>,
}

/// What each cluster looks like: size, spend and its most common category.
/// Category ties go to the earlier category in precedence order.
pub fn cluster_profiles(rows: &[Transaction]) -> Vec<ClusterProfile> {
    let mut by_cluster: BTreeMap<usize, Vec<&Transaction>> = BTreeMap::new();
    for row in rows {
        if let Some(c) = row.cluster {
            by_cluster.entry(c).or_default().push(row);
        }
    }
    by_cluster
        .into_iter()
        .map(|(cluster, members)| {
            let count = members.len();
            let total: f64 = members.iter().map(|r| r.amount).sum();
            let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
            for r in &members {
                if let Some(cat) = r.category {
                    *counts.entry(cat).or_insert(0) += 1;
                }
            }
            let dominant_category = counts
                .iter()
                .fold(None::<(Category, usize)>, |best, (&cat, &n)| match best {
                    Some((_, best_n)) if best_n >= n => best,
                    _ => Some((cat, n)),
                })
                .map(|(cat, _)| cat);
            ClusterProfile {
                cluster,
                count,
                total,
                mean: total / count as f64,
                dominant_category,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Everything the presentation layer needs, computed once
// ---------------------------------------------------------------------------

pub struct SpendingReport {
    pub categories: Vec<CategoryTotal>,
    pub months: Vec<MonthTotal>,
    pub merchants: Vec<MerchantTotal>,
    pub trend: Vec<TrendPoint>,
    pub clusters: Vec<ClusterProfile>,
    pub total: f64,
    pub count: usize,
}

pub fn build_report(rows: &[Transaction], top_n: usize) -> SpendingReport {
    SpendingReport {
        categories: category_totals(rows),
        months: monthly_totals(rows),
        merchants: top_merchants(rows, top_n),
        trend: cumulative_trend(rows),
        clusters: cluster_profiles(rows),
        total: rows.iter().map(|r| r.amount).sum(),
        count: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn txn(date: &str, desc: &str, amount: f64, cat: Category, cluster: usize) -> Transaction {
        let mut t = Transaction::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            desc,
            amount,
        );
        t.category = Some(cat);
        t.cluster = Some(cluster);
        t
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            txn("2024-01-01", "Uber Eats Order", 15.50, Category::Food, 0),
            txn("2024-01-03", "Amazon.com", 42.00, Category::Shopping, 1),
            txn("2024-02-01", "Netflix", 12.99, Category::Entertainment, 0),
        ]
    }

    #[test]
    fn test_category_totals() {
        let totals = category_totals(&scenario());
        let names: Vec<_> = totals.iter().map(|t| t.category).collect();
        assert_eq!(
            names,
            vec![Category::Shopping, Category::Food, Category::Entertainment]
        );
        assert!(approx(totals[0].total, 42.00));
        assert!(approx(totals[1].total, 15.50));
        assert!(approx(totals[2].total, 12.99));
    }

    #[test]
    fn test_monthly_totals() {
        let months = monthly_totals(&scenario());
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert!(approx(months[0].total, 57.50));
        assert_eq!(months[1].month, "2024-02");
        assert!(approx(months[1].total, 12.99));
    }

    #[test]
    fn test_top_merchants_limits_and_orders() {
        let mut rows = scenario();
        rows.push(txn("2024-02-02", "Netflix", 12.99, Category::Entertainment, 0));
        let top = top_merchants(&rows, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].description, "Amazon.com");
        assert_eq!(top[1].description, "Netflix");
        assert_eq!(top[1].count, 2);
        assert!(approx(top[1].total, 25.98));
    }

    #[test]
    fn test_top_merchants_ties_by_name() {
        let rows = vec![
            txn("2024-01-01", "Zomato", 10.0, Category::Food, 0),
            txn("2024-01-01", "Swiggy", 10.0, Category::Food, 0),
        ];
        let top = top_merchants(&rows, 5);
        assert_eq!(top[0].description, "Swiggy");
        assert_eq!(top[1].description, "Zomato");
    }

    #[test]
    fn test_cumulative_trend_groups_by_date() {
        let mut rows = scenario();
        rows.push(txn("2024-01-01", "Pizza Hut", 4.50, Category::Food, 0));
        let trend = cumulative_trend(&rows);
        assert_eq!(trend.len(), 3);
        assert!(approx(trend[0].daily, 20.0));
        assert!(approx(trend[1].cumulative, 62.0));
        assert!(approx(trend[2].cumulative, 74.99));
    }

    #[test]
    fn test_cluster_profiles() {
        let profiles = cluster_profiles(&scenario());
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].cluster, 0);
        assert_eq!(profiles[0].count, 2);
        assert!(approx(profiles[0].mean, (15.50 + 12.99) / 2.0));
        // Food and Entertainment tie; Food comes first
        assert_eq!(profiles[0].dominant_category, Some(Category::Food));
        assert_eq!(profiles[1].dominant_category, Some(Category::Shopping));
    }

    #[test]
    fn test_empty_rows_give_empty_report() {
        let report = build_report(&[], 5);
        assert!(report.categories.is_empty());
        assert!(report.months.is_empty());
        assert!(report.merchants.is_empty());
        assert!(report.trend.is_empty());
        assert!(report.clusters.is_empty());
        assert_eq!(report.count, 0);
    }
}
