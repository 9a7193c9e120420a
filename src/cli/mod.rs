pub mod analyze;
pub mod categorize;
pub mod charts;
pub mod dashboard;
pub mod export;
pub mod init;
pub mod keywords;
pub mod text;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cluster::ClusterParams;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "spendingspy",
    version,
    about = "Categorize, cluster and chart a personal-finance CSV export."
)]
pub struct Cli {
    /// Settings file (default: ~/.config/spendingspy/settings.json)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the clustering settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Number of clusters
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,
    /// Random seed for k-means initialization
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ClusterArgs {
    pub fn params(&self, settings: &Settings) -> ClusterParams {
        let mut params = settings.cluster_params();
        if let Some(k) = self.clusters {
            params.n_clusters = k;
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        params
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize and cluster a CSV export and print the summaries.
    Analyze {
        /// CSV file with date, description and amount columns
        file: PathBuf,
        #[command(flatten)]
        cluster: ClusterArgs,
        /// Also write the enriched CSV here
        #[arg(long)]
        export: Option<PathBuf>,
        /// Also write SVG charts into this directory
        #[arg(long)]
        charts: Option<PathBuf>,
        /// Show at most this many transactions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the category for a single description.
    Categorize {
        /// Transaction description, e.g. 'UBER EATS 1234'
        description: String,
    },
    /// Write the CSV with category and cluster columns appended.
    Export {
        file: PathBuf,
        #[command(flatten)]
        cluster: ClusterArgs,
        /// Output path (default: <output_dir>/categorized_output.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the spending charts as SVG files.
    Charts {
        file: PathBuf,
        /// Directory for the SVG files (default: <output_dir>)
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },
    /// List the keyword table in precedence order.
    Keywords,
    /// Open the interactive dashboard for a CSV export.
    Dashboard {
        file: PathBuf,
        #[command(flatten)]
        cluster: ClusterArgs,
    },
    /// Write a settings file with the defaults.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cluster_args_override_settings() {
        let cli = Cli::try_parse_from(["spendingspy", "analyze", "x.csv", "-k", "5", "--seed", "7"])
            .unwrap();
        let Commands::Analyze { cluster, .. } = cli.command else {
            panic!("expected analyze");
        };
        let params = cluster.params(&Settings::default());
        assert_eq!(params.n_clusters, 5);
        assert_eq!(params.seed, 7);
        assert_eq!(params.max_iterations, 300);
    }

    #[test]
    fn test_cluster_args_fall_back_to_settings() {
        let settings = Settings {
            clusters: 4,
            ..Settings::default()
        };
        let params = ClusterArgs::default().params(&settings);
        assert_eq!(params.n_clusters, 4);
        assert_eq!(params.seed, 42);
    }
}
