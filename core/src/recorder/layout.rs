use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::grid::ParameterPair;

/// Where every artifact of a sweep lives.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub root: PathBuf,
    pub trial_dir: PathBuf,
    pub solutions_log: PathBuf,
    pub progress_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub summary_json: PathBuf,
}

impl ArtifactLayout {
    pub fn from_config(cfg: &OutputConfig) -> Self {
        let root = PathBuf::from(&cfg.directory);
        Self {
            trial_dir: root.join(&cfg.trial_dir),
            solutions_log: root.join(&cfg.solutions_log),
            progress_csv: root.join(&cfg.progress_csv),
            summary_csv: root.join(&cfg.summary_csv),
            summary_json: root.join(&cfg.summary_json),
            root,
        }
    }

    /// Default file names under `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let cfg = OutputConfig {
            directory: root.as_ref().to_string_lossy().to_string(),
            ..OutputConfig::default()
        };
        Self::from_config(&cfg)
    }

    pub fn trial_path(&self, pair: ParameterPair) -> PathBuf {
        self.trial_dir
            .join(format!("output_bit_i{}_j{}.txt", pair.i, pair.j))
    }
}
