use std::path::{Path, PathBuf};

use crate::cli::ClusterArgs;
use crate::error::Result;
use crate::export::{export_to_path, DEFAULT_EXPORT_NAME};
use crate::pipeline::analyze_path;
use crate::settings::Settings;

pub fn default_export_path(settings: &Settings) -> PathBuf {
    settings.output_dir().join(DEFAULT_EXPORT_NAME)
}

pub fn run(file: &Path, cluster: &ClusterArgs, output: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let analysis = analyze_path(file, &settings.keyword_table(), &cluster.params(settings))?;
    let path = output.unwrap_or_else(|| default_export_path(settings));
    export_to_path(&analysis.table, &path)?;
    println!("Wrote {} transactions to {}", analysis.table.len(), path.display());
    Ok(())
}
