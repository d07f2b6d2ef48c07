//! Seeded synthetic datasets for demos and tests.

use crate::dataset::Dataset;
use crate::error::{PipelineError, PipelineResult};
use crate::Vector;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::{Normal, Uniform};
use rand::SeedableRng;
use rand::rngs::StdRng;

const X_RANGE: (f64, f64) = (0.0, 10.0);

/// `n` rows of `y = slope * x + intercept + N(0, noise_std)`, with `x`
/// uniform over `[0, 10)`.
pub fn linear(
    n: usize,
    slope: f64,
    intercept: f64,
    noise_std: f64,
    seed: u64,
) -> PipelineResult<Dataset> {
    let normal = Normal::new(0.0, noise_std)
        .map_err(|e| PipelineError::value(format!("invalid noise level {noise_std}: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let x = Vector::random_using(n, Uniform::new(X_RANGE.0, X_RANGE.1), &mut rng);
    let noise = Vector::random_using(n, normal, &mut rng);
    let y = x.mapv(|v| slope * v + intercept) + noise;

    Ok(Dataset::new(x, y)?.with_source("<synthetic>"))
}

/// `n` rows where the response is independent of the predictor.
pub fn noise(n: usize, seed: u64) -> PipelineResult<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Vector::random_using(n, Uniform::new(X_RANGE.0, X_RANGE.1), &mut rng);
    let y = Vector::random_using(n, Uniform::new(X_RANGE.0, X_RANGE.1), &mut rng);

    Ok(Dataset::new(x, y)?.with_source("<synthetic>"))
}

/// Render a dataset as CSV with its column names as the header.
pub fn to_csv(dataset: &Dataset) -> PipelineResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let encode = |e: csv::Error| PipelineError::value(format!("encoding csv: {e}"));

    writer
        .write_record([dataset.predictor_name(), dataset.response_name()])
        .map_err(encode)?;
    for (x, y) in dataset.rows() {
        writer
            .write_record([x.to_string(), y.to_string()])
            .map_err(encode)?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::value(format!("encoding csv: {e}")))
}
