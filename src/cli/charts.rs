use std::path::{Path, PathBuf};

use crate::charts::write_charts;
use crate::error::Result;
use crate::pipeline::analyze_path;
use crate::reports::build_report;
use crate::settings::Settings;

pub fn run(file: &Path, output_dir: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let analysis = analyze_path(file, &settings.keyword_table(), &settings.cluster_params())?;
    let report = build_report(&analysis.table.rows, settings.top_merchants);
    let dir = output_dir.unwrap_or_else(|| settings.output_dir());
    for path in write_charts(&report, &dir)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
