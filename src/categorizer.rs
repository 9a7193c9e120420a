use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::SpyError;
use crate::models::TransactionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Food,
    Groceries,
    Rent,
    Entertainment,
    Utilities,
    Transport,
    Shopping,
    Travel,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Food,
        Self::Groceries,
        Self::Rent,
        Self::Entertainment,
        Self::Utilities,
        Self::Transport,
        Self::Shopping,
        Self::Travel,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Groceries => "Groceries",
            Self::Rent => "Rent",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Travel => "Travel",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = SpyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| SpyError::Other(format!("Unknown category: {s}")))
    }
}

/// Settings files may spell categories in any case.
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of the keyword table: any keyword found in a description
/// assigns `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, desc_lower: &str) -> bool {
        self.keywords.iter().any(|k| desc_lower.contains(k.as_str()))
    }
}

/// Ordered keyword table. Precedence is list order: the first rule with a
/// matching keyword wins, so a description naming both a streaming service and
/// a retailer lands in whichever category comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    /// Keywords are stored lowercase so matching is case-insensitive. Blank
    /// keywords would match every description and are dropped.
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| KeywordRule {
                category: r.category,
                keywords: r
                    .keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| k.to_lowercase())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn categorize(&self, description: &str) -> Category {
        let desc = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&desc))
            .map(|rule| rule.category)
            .unwrap_or(Category::Other)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(
                    Category::Food,
                    &["uber eats", "swiggy", "zomato", "mcdonalds", "pizza"],
                ),
                KeywordRule::new(
                    Category::Groceries,
                    &["walmart", "whole foods", "trader joe", "kroger"],
                ),
                KeywordRule::new(Category::Rent, &["rent", "apartment", "lease"]),
                KeywordRule::new(Category::Entertainment, &["netflix", "spotify", "youtube"]),
                KeywordRule::new(
                    Category::Utilities,
                    &["electricity", "gas", "water", "comcast", "internet"],
                ),
                KeywordRule::new(
                    Category::Transport,
                    &["uber", "lyft", "metro", "gas station"],
                ),
                KeywordRule::new(Category::Shopping, &["amazon", "flipkart", "target"]),
                KeywordRule::new(
                    Category::Travel,
                    &["airbnb", "delta", "hotel", "make my trip"],
                ),
            ],
        }
    }
}

pub struct CategorizeResult {
    pub categorized: usize,
    pub other: usize,
}

/// Label every row of the table. Rows are independent; re-running is idempotent.
pub fn categorize_table(table: &mut TransactionTable, keywords: &KeywordTable) -> CategorizeResult {
    let mut categorized = 0usize;
    let mut other = 0usize;

    for row in &mut table.rows {
        let category = keywords.categorize(&row.description);
        if category == Category::Other {
            other += 1;
        } else {
            categorized += 1;
        }
        row.category = Some(category);
    }

    debug!(categorized, other, "categorized transactions");
    CategorizeResult { categorized, other }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transaction;
    use chrono::NaiveDate;

    fn categorize(description: &str) -> Category {
        KeywordTable::default().categorize(description)
    }

    fn table_of(descriptions: &[&str]) -> TransactionTable {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TransactionTable {
            headers: vec!["date".into(), "description".into(), "amount".into()],
            records: descriptions
                .iter()
                .map(|d| vec!["2024-01-01".to_string(), d.to_string(), "1".to_string()])
                .collect(),
            rows: descriptions
                .iter()
                .map(|d| Transaction::new(date, *d, 1.0))
                .collect(),
        }
    }

    #[test]
    fn test_no_keyword_is_other() {
        assert_eq!(categorize("Corner Bakery"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn test_single_category_keywords() {
        assert_eq!(categorize("Swiggy order #42"), Category::Food);
        assert_eq!(categorize("KROGER #1234"), Category::Groceries);
        assert_eq!(categorize("March apartment payment"), Category::Rent);
        assert_eq!(categorize("Spotify Premium"), Category::Entertainment);
        assert_eq!(categorize("Comcast Cable"), Category::Utilities);
        assert_eq!(categorize("Lyft ride"), Category::Transport);
        assert_eq!(categorize("Flipkart"), Category::Shopping);
        assert_eq!(categorize("Hilton Hotel"), Category::Travel);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize("UBER EATS"), Category::Food);
        assert_eq!(categorize("uber eats"), Category::Food);
    }

    #[test]
    fn test_earlier_category_wins() {
        assert_eq!(categorize("Netflix via Amazon"), Category::Entertainment);
        // "uber eats" is Food, checked before Transport's "uber"
        assert_eq!(categorize("Uber Eats"), Category::Food);
        assert_eq!(categorize("Uber trip downtown"), Category::Transport);
        // Utilities' "gas" precedes Transport's "gas station"
        assert_eq!(categorize("Shell Gas Station"), Category::Utilities);
    }

    #[test]
    fn test_custom_table_order_is_respected() {
        let table = KeywordTable::new(vec![
            KeywordRule {
                category: Category::Shopping,
                keywords: vec!["AMAZON".into()],
            },
            KeywordRule {
                category: Category::Entertainment,
                keywords: vec!["prime video".into()],
            },
        ]);
        assert_eq!(table.categorize("Amazon Prime Video"), Category::Shopping);
        assert_eq!(table.categorize("netflix"), Category::Other);
    }

    #[test]
    fn test_blank_keywords_match_nothing() {
        let table = KeywordTable::new(vec![
            KeywordRule {
                category: Category::Rent,
                keywords: vec!["".into(), "   ".into()],
            },
            KeywordRule {
                category: Category::Food,
                keywords: vec!["bakery".into()],
            },
        ]);
        assert!(table.rules()[0].keywords.is_empty());
        assert_eq!(table.categorize("Corner Bakery"), Category::Food);
        assert_eq!(table.categorize("Hardware store"), Category::Other);
    }

    #[test]
    fn test_every_default_keyword_resolves_by_precedence() {
        let table = KeywordTable::default();
        for (i, rule) in table.rules().iter().enumerate() {
            for keyword in &rule.keywords {
                let earlier = table.rules()[..i]
                    .iter()
                    .find(|r| r.keywords.iter().any(|k| keyword.contains(k.as_str())));
                let expected = earlier.map_or(rule.category, |r| r.category);
                assert_eq!(
                    table.categorize(&keyword.to_uppercase()),
                    expected,
                    "keyword {keyword:?}"
                );
            }
        }
        assert_eq!(table.categorize("gas station"), Category::Utilities);
        assert_eq!(table.categorize("uber"), Category::Transport);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("groceries".parse::<Category>().unwrap(), Category::Groceries);
        assert_eq!(" Travel ".parse::<Category>().unwrap(), Category::Travel);
        assert!("Pets".parse::<Category>().is_err());
    }

    #[test]
    fn test_categorize_table_labels_every_row() {
        let mut table = table_of(&["Uber Eats Order", "Amazon.com", "Netflix", "Mystery"]);
        let result = categorize_table(&mut table, &KeywordTable::default());
        assert_eq!(result.categorized, 3);
        assert_eq!(result.other, 1);
        let labels: Vec<_> = table.rows.iter().map(|r| r.category.unwrap()).collect();
        assert_eq!(
            labels,
            vec![Category::Food, Category::Shopping, Category::Entertainment, Category::Other]
        );
        assert!(table.is_categorized());
    }

    #[test]
    fn test_recategorizing_is_idempotent() {
        let mut table = table_of(&["Walmart Supercenter", "Delta Air Lines"]);
        categorize_table(&mut table, &KeywordTable::default());
        let first: Vec<_> = table.rows.iter().map(|r| r.category).collect();
        categorize_table(&mut table, &KeywordTable::default());
        let second: Vec<_> = table.rows.iter().map(|r| r.category).collect();
        assert_eq!(first, second);
    }
}
