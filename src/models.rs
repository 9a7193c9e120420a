use chrono::NaiveDate;

use crate::categorizer::Category;

/// One parsed transaction. `category` and `cluster` stay `None` until the
/// categorize and cluster stages have run.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: Option<Category>,
    pub cluster: Option<usize>,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            category: None,
            cluster: None,
        }
    }

    /// Calendar month as `YYYY-MM`.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Typed rows alongside the raw input columns they were parsed from.
/// `records[i]` is the verbatim source row for `rows[i]`; the export mirrors it.
#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
    pub rows: Vec<Transaction>,
}

impl TransactionTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_categorized(&self) -> bool {
        self.rows.iter().all(|r| r.category.is_some())
    }

    pub fn is_clustered(&self) -> bool {
        self.rows.iter().all(|r| r.cluster.is_some())
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.amount).sum()
    }
}
