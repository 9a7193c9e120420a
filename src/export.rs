use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::TransactionTable;

pub const DEFAULT_EXPORT_NAME: &str = "categorized_output.csv";
pub const CATEGORY_COLUMN: &str = "category";
pub const CLUSTER_COLUMN: &str = "cluster";

/// Column layout of the export: the input header plus `category` and `cluster`.
/// Existing `category`/`cluster` columns are reused in place.
fn export_layout(headers: &[String]) -> (Vec<String>, usize, usize) {
    let mut out = headers.to_vec();
    let mut slot = |name: &str| match out.iter().position(|h| h == name) {
        Some(i) => i,
        None => {
            out.push(name.to_string());
            out.len() - 1
        }
    };
    let cat_idx = slot(CATEGORY_COLUMN);
    let cluster_idx = slot(CLUSTER_COLUMN);
    (out, cat_idx, cluster_idx)
}

/// Write the enriched table as UTF-8 CSV with no index column.
pub fn write_csv<W: Write>(table: &TransactionTable, writer: W) -> Result<()> {
    let (headers, cat_idx, cluster_idx) = export_layout(&table.headers);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;

    for (record, row) in table.records.iter().zip(&table.rows) {
        let mut fields = record.clone();
        fields.resize(headers.len(), String::new());
        fields[cat_idx] = row.category.map(|c| c.label().to_string()).unwrap_or_default();
        fields[cluster_idx] = row.cluster.map(|c| c.to_string()).unwrap_or_default();
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path(table: &TransactionTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, std::io::BufWriter::new(file))?;
    info!(path = %path.display(), rows = table.len(), "wrote export");
    Ok(())
}
