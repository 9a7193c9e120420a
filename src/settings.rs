use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorizer::{KeywordRule, KeywordTable};
use crate::cluster::ClusterParams;
use crate::error::{Result, SpyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_n_runs")]
    pub n_runs: usize,
    #[serde(default = "default_top_merchants")]
    pub top_merchants: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Ordered keyword rules; `None` uses the built-in table.
    #[serde(default)]
    pub keywords: Option<Vec<KeywordRule>>,
}

fn default_clusters() -> usize {
    3
}

fn default_seed() -> u64 {
    42
}

fn default_max_iterations() -> u64 {
    300
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_n_runs() -> usize {
    10
}

fn default_top_merchants() -> usize {
    5
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            n_runs: default_n_runs(),
            top_merchants: default_top_merchants(),
            output_dir: default_output_dir(),
            keywords: None,
        }
    }
}

impl Settings {
    pub fn keyword_table(&self) -> KeywordTable {
        match &self.keywords {
            Some(rules) => KeywordTable::new(rules.clone()),
            None => KeywordTable::default(),
        }
    }

    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            n_clusters: self.clusters,
            seed: self.seed,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            n_runs: self.n_runs,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.output_dir))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendingspy")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load settings from `path`, or from the default location. A missing file
/// means defaults; a file that does not parse is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);
    if !path.exists() {
        debug!(path = %path.display(), "no settings file; using defaults");
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| SpyError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}
