//! Runtime configuration: built-in defaults, then an optional TOML file,
//! then `REGRESS_*` environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "REGRESS_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the local object store buckets.
    pub store_root: PathBuf,
    pub bucket: String,
    /// Key of the dataset the first model is trained on.
    pub dataset_key: String,
    /// Key of the newly arrived dataset checked against the stored model.
    pub new_dataset_key: String,
    pub predictor_column: String,
    pub response_column: String,
    /// Share of rows assigned to the training subset.
    pub train_fraction: f64,
    pub seed: u64,
    /// Model artifacts live under `<model_prefix>/v<N>/model.json`.
    pub model_prefix: String,
    /// Retrain when the stored model scores below this R².
    pub retrain_threshold: f64,
    /// Delete prior model artifacts before a full run.
    pub clean_start: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("./store"),
            bucket: "regression-demo".to_string(),
            dataset_key: "data/initial.csv".to_string(),
            new_dataset_key: "data/shifted.csv".to_string(),
            predictor_column: "x".to_string(),
            response_column: "y".to_string(),
            train_fraction: 0.8,
            seed: 42,
            model_prefix: "params".to_string(),
            retrain_threshold: 0.5,
            clean_start: true,
        }
    }
}

impl PipelineConfig {
    /// Load from `path` (or `$REGRESS_CONFIG`), apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut cfg = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> PipelineResult<Self> {
        toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Overlay `REGRESS_*` values returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> PipelineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, raw: String) -> PipelineResult<T> {
            raw.trim()
                .parse()
                .map_err(|_| PipelineError::Config(format!("{key}=`{raw}` is not valid")))
        }

        if let Some(v) = lookup("REGRESS_STORE_ROOT") {
            self.store_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("REGRESS_BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = lookup("REGRESS_SEED") {
            self.seed = parsed("REGRESS_SEED", v)?;
        }
        if let Some(v) = lookup("REGRESS_TRAIN_FRACTION") {
            self.train_fraction = parsed("REGRESS_TRAIN_FRACTION", v)?;
        }
        if let Some(v) = lookup("REGRESS_RETRAIN_THRESHOLD") {
            self.retrain_threshold = parsed("REGRESS_RETRAIN_THRESHOLD", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "train_fraction must be between 0 and 1 (exclusive), got {}",
                self.train_fraction
            )));
        }
        if !self.retrain_threshold.is_finite() {
            return Err(PipelineError::Config(format!(
                "retrain_threshold must be finite, got {}",
                self.retrain_threshold
            )));
        }

        let required = [
            ("bucket", &self.bucket),
            ("dataset_key", &self.dataset_key),
            ("new_dataset_key", &self.new_dataset_key),
            ("predictor_column", &self.predictor_column),
            ("response_column", &self.response_column),
            ("model_prefix", &self.model_prefix),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PipelineError::Config(format!("{name} must not be empty")));
            }
        }

        if self.predictor_column == self.response_column {
            return Err(PipelineError::Config(format!(
                "predictor and response columns are both `{}`",
                self.predictor_column
            )));
        }
        Ok(())
    }
}
