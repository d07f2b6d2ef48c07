//! Writes the two demo datasets into the configured local store:
//! an initial batch following `y = 2x + 1` and a later batch following
//! `y = -3x + 40`, both with Gaussian noise.

use anyhow::{Context, Result};
use regress_pipeline::{FsObjectStore, ObjectStore, PipelineConfig, synthetic};

const ROWS: usize = 200;
const NOISE_STD: f64 = 0.5;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref()).context("loading configuration")?;
    let store = FsObjectStore::from_config(&config).context("opening object store")?;

    let batches = [
        (&config.dataset_key, 2.0, 1.0, config.seed),
        (&config.new_dataset_key, -3.0, 40.0, config.seed.wrapping_add(1)),
    ];

    for (key, slope, intercept, seed) in batches {
        let dataset = synthetic::linear(ROWS, slope, intercept, NOISE_STD, seed)?
            .with_columns(&config.predictor_column, &config.response_column);
        let bytes = synthetic::to_csv(&dataset)?;
        store
            .put(key, &bytes)
            .with_context(|| format!("writing {key}"))?;
        log::info!(
            "wrote {ROWS} rows ({} = {slope} * {} + {intercept}) to {}",
            config.response_column,
            config.predictor_column,
            store.root().join(key).display()
        );
    }

    Ok(())
}
