use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::info;

use crate::categorizer::{categorize_table, CategorizeResult, KeywordTable};
use crate::cluster::{cluster_transactions, ClusterModel, ClusterParams};
use crate::error::Result;
use crate::loader::{load_stream, RawTable};
use crate::models::TransactionTable;

/// A fully processed batch: categorized, clustered rows plus run statistics.
pub struct Analysis {
    pub table: TransactionTable,
    pub categorize: CategorizeResult,
    pub model: ClusterModel,
}

/// Parse and categorize a loaded table.
pub fn process_csv(raw: RawTable, keywords: &KeywordTable) -> Result<(TransactionTable, CategorizeResult)> {
    let mut table = raw.into_transactions()?;
    let result = categorize_table(&mut table, keywords);
    Ok((table, result))
}

fn analyze(raw: RawTable, keywords: &KeywordTable, params: &ClusterParams) -> Result<Analysis> {
    let (mut table, categorize) = process_csv(raw, keywords)?;
    let model = cluster_transactions(&mut table, params)?;
    debug_assert!(table.is_categorized() && table.is_clustered());
    info!(
        rows = table.len(),
        categorized = categorize.categorized,
        other = categorize.other,
        clusters = model.n_clusters,
        "analysis complete"
    );
    Ok(Analysis {
        table,
        categorize,
        model,
    })
}

/// Load, categorize and cluster a CSV file. Any bad row fails the whole run.
pub fn analyze_path(path: &Path, keywords: &KeywordTable, params: &ClusterParams) -> Result<Analysis> {
    let mut file = BufReader::new(File::open(path)?);
    analyze_stream(&mut file, keywords, params)
}

/// Same as [`analyze_path`] for an in-memory or seekable source; the source is
/// rewound first so it can be analyzed repeatedly.
pub fn analyze_stream<S: Read + Seek>(
    source: &mut S,
    keywords: &KeywordTable,
    params: &ClusterParams,
) -> Result<Analysis> {
    analyze(load_stream(source)?, keywords, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Category;
    use crate::error::SpyError;
    use crate::reports::{category_totals, monthly_totals};
    use std::io::Cursor;

    const SCENARIO: &str = "date,description,amount\n\
                            2024-01-01,Uber Eats Order,15.50\n\
                            2024-01-03,Amazon.com,42.00\n\
                            2024-02-01,Netflix,12.99\n";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut cursor = Cursor::new(SCENARIO.as_bytes().to_vec());
        let analysis =
            analyze_stream(&mut cursor, &KeywordTable::default(), &ClusterParams::default())
                .unwrap();
        let cats: Vec<_> = analysis.table.rows.iter().map(|r| r.category.unwrap()).collect();
        assert_eq!(cats, vec![Category::Food, Category::Shopping, Category::Entertainment]);
        assert!(analysis.table.rows.iter().all(|r| r.cluster.unwrap() < 3));

        let totals = category_totals(&analysis.table.rows);
        let get = |c: Category| totals.iter().find(|t| t.category == c).unwrap().total;
        assert!(approx(get(Category::Food), 15.50));
        assert!(approx(get(Category::Shopping), 42.00));
        assert!(approx(get(Category::Entertainment), 12.99));

        let months = monthly_totals(&analysis.table.rows);
        assert_eq!(months[0].month, "2024-01");
        assert!(approx(months[0].total, 57.50));
        assert_eq!(months[1].month, "2024-02");
        assert!(approx(months[1].total, 12.99));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let input = "date,description,amount\n\
                     2024-01-01,Uber Eats Order,15.50\n\
                     2024-01-02,Amazon.com,42.00\n\
                     2024-01-03,Netflix,12.99\n\
                     2024-01-04,Rent January,1200.00\n\
                     2024-01-05,Walmart,86.12\n\
                     2024-01-06,Lyft,23.40\n\
                     2024-01-07,Netflix,12.99\n\
                     2024-01-08,Airbnb Lisbon,640.00\n";
        let run = || {
            let mut cursor = Cursor::new(input.as_bytes().to_vec());
            analyze_stream(&mut cursor, &KeywordTable::default(), &ClusterParams::default())
                .unwrap()
                .table
                .rows
                .iter()
                .map(|r| r.cluster.unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_analyze_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txns.csv");
        std::fs::write(&path, SCENARIO).unwrap();
        let analysis =
            analyze_path(&path, &KeywordTable::default(), &ClusterParams::default()).unwrap();
        assert_eq!(analysis.table.len(), 3);
        assert_eq!(analysis.table.rows[1].category, Some(Category::Shopping));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyze_path(
            &dir.path().join("nope.csv"),
            &KeywordTable::default(),
            &ClusterParams::default(),
        );
        assert!(matches!(result, Err(SpyError::Io(_))));
    }

    #[test]
    fn test_same_stream_analyzed_twice() {
        let mut cursor = Cursor::new(SCENARIO.as_bytes().to_vec());
        let params = ClusterParams::default();
        let first = analyze_stream(&mut cursor, &KeywordTable::default(), &params).unwrap();
        let second = analyze_stream(&mut cursor, &KeywordTable::default(), &params).unwrap();
        assert_eq!(first.table.rows, second.table.rows);
    }

    #[test]
    fn test_bad_amount_fails_whole_run() {
        let mut cursor = Cursor::new(
            "date,description,amount\n2024-01-01,Netflix,12.99\n2024-01-02,Lyft,n/a\n"
                .as_bytes()
                .to_vec(),
        );
        let result = analyze_stream(&mut cursor, &KeywordTable::default(), &ClusterParams::default());
        assert!(matches!(result, Err(SpyError::InvalidAmount { row: 2, .. })));
    }

    #[test]
    fn test_header_only_input_is_an_empty_success() {
        let mut cursor = Cursor::new(b"date,description,amount\n".to_vec());
        let analysis =
            analyze_stream(&mut cursor, &KeywordTable::default(), &ClusterParams::default())
                .unwrap();
        assert!(analysis.table.is_empty());
        assert_eq!(analysis.model.n_clusters, 0);
    }
}
