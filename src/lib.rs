//! Batch regression pipeline over a key-addressed object store.
//!
//! The flow is strictly sequential: read a two-column CSV from the store,
//! split it with a seeded shuffle, fit a univariate least-squares line, score
//! it with R², and write the fitted parameters back under a versioned key.
//! A later run reloads that model, scores it against newly arrived data and
//! retrains under a new key when the score falls below a threshold.
//!
//! ```rust
//! use regress_pipeline::{MemoryObjectStore, Pipeline, PipelineConfig, ObjectStore};
//!
//! let store = MemoryObjectStore::new();
//! store.put("data/initial.csv", b"x,y\n1,3\n2,5\n3,7\n4,9\n5,11\n6,13\n7,15\n8,17\n9,19\n10,21\n").unwrap();
//!
//! let pipeline = Pipeline::new(store, PipelineConfig::default());
//! let report = pipeline.train("data/initial.csv", "params/v1/model.json").unwrap();
//! assert!((report.model.slope() - 2.0).abs() < 1e-9);
//! ```

pub use ndarray::Array1;

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod linear_model;
pub mod metrics;
pub mod pipeline;
pub mod storage;
pub mod synthetic;

pub use artifact::{ModelArtifact, model_key};
pub use config::PipelineConfig;
pub use dataset::Dataset;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use linear_model::{LinearModel, LinearRegression};
pub use pipeline::{Evaluation, MonitorOutcome, Pipeline, RetrainPolicy, RunSummary, TrainReport};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};

pub type Vector = Array1<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let vec = Vector::zeros(5);
        assert_eq!(vec.len(), 5);
    }
}
