//! The batch runner tying storage, splitting, fitting and scoring together.
//!
//! ```text
//!   train:    get dataset ─► split ─► fit ─► score train/test ─► put params/vN
//!   monitor:  get params/vN ─► get new dataset ─► score
//!                 └─ below threshold ─► train on new dataset ─► put params/vN+1
//! ```

use crate::artifact::{ModelArtifact, model_key};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::{PipelineError, PipelineResult};
use crate::linear_model::{LinearModel, LinearRegression};
use crate::metrics;
use crate::storage::ObjectStore;

/// Decides whether a stored model still fits incoming data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrainPolicy {
    threshold: f64,
}

impl RetrainPolicy {
    pub const DEFAULT_THRESHOLD: f64 = 0.5;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when `score` is below the threshold. NaN always retrains.
    pub fn needs_retrain(&self, score: f64) -> bool {
        !(score >= self.threshold)
    }
}

impl Default for RetrainPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

/// Fit quality of a model on one dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub rows: usize,
    pub r2: f64,
    pub mse: f64,
    pub mae: f64,
}

pub fn evaluate(model: &LinearModel, dataset: &Dataset) -> PipelineResult<Evaluation> {
    let y_pred = model.predict(dataset.predictor());
    let y_true = dataset.response();

    Ok(Evaluation {
        rows: dataset.n_samples(),
        r2: metrics::r2_score(y_true, &y_pred)?,
        mse: metrics::mean_squared_error(y_true, &y_pred)?,
        mae: metrics::mean_absolute_error(y_true, &y_pred)?,
    })
}

#[derive(Clone, Debug)]
pub struct TrainReport {
    pub model: LinearModel,
    /// Key the fitted model was written under.
    pub key: String,
    pub dataset: String,
    pub train: Evaluation,
    pub test: Evaluation,
}

#[derive(Clone, Debug)]
pub enum MonitorOutcome {
    /// The stored model still fits the new data; nothing was written.
    Adequate { score: f64 },
    /// The stored model scored below the threshold and was superseded.
    Retrained {
        previous_score: f64,
        report: TrainReport,
    },
}

/// Result of the full two-stage run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub cleaned: usize,
    pub initial: TrainReport,
    pub outcome: MonitorOutcome,
}

pub struct Pipeline<S> {
    store: S,
    config: PipelineConfig,
    policy: RetrainPolicy,
    estimator: LinearRegression,
}

impl<S: ObjectStore> Pipeline<S> {
    pub fn new(store: S, config: PipelineConfig) -> Self {
        let policy = RetrainPolicy::new(config.retrain_threshold);
        Self {
            store,
            config,
            policy,
            estimator: LinearRegression::new(),
        }
    }

    pub fn with_estimator(mut self, estimator: LinearRegression) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn policy(&self) -> RetrainPolicy {
        self.policy
    }

    pub fn load_dataset(&self, key: &str) -> PipelineResult<Dataset> {
        let bytes = self.store.get(key)?;
        let dataset = Dataset::from_csv(
            &bytes,
            key,
            &self.config.predictor_column,
            &self.config.response_column,
        )?;
        log::info!("loaded {} rows from {key}", dataset.n_samples());
        Ok(dataset)
    }

    /// Split with the configured fraction and seed. Both subsets must be
    /// non-empty, since the model is fitted on one and scored on the other.
    pub fn split(&self, dataset: &Dataset) -> PipelineResult<(Dataset, Dataset)> {
        let (train, test) = dataset.train_test_split(self.config.train_fraction, self.config.seed)?;
        for (name, subset) in [("training", &train), ("test", &test)] {
            if subset.is_empty() {
                return Err(PipelineError::value(format!(
                    "split left the {name} subset empty; {} has {} rows at train fraction {}",
                    dataset.source(),
                    dataset.n_samples(),
                    self.config.train_fraction
                )));
            }
        }
        log::info!(
            "split {}: {} train / {} test (seed {})",
            dataset.source(),
            train.n_samples(),
            test.n_samples(),
            self.config.seed
        );
        Ok((train, test))
    }

    pub fn fit(&self, train: &Dataset) -> PipelineResult<LinearModel> {
        let model = self.estimator.fit(train)?;
        log::info!(
            "fitted {} = {:.6} * {} + {:.6}",
            train.response_name(),
            model.slope(),
            train.predictor_name(),
            model.intercept()
        );
        Ok(model)
    }

    pub fn score(&self, model: &LinearModel, dataset: &Dataset) -> PipelineResult<f64> {
        model.score(dataset)
    }

    /// Store a bare model under `key`, replacing whatever was there.
    pub fn save_model(&self, model: &LinearModel, key: &str) -> PipelineResult<()> {
        self.save_artifact(&ModelArtifact::new(model, key))
    }

    pub fn save_artifact(&self, artifact: &ModelArtifact) -> PipelineResult<()> {
        let bytes = artifact.encode()?;
        self.store.put(artifact.key(), &bytes)?;
        log::info!("saved model to {}", artifact.key());
        Ok(())
    }

    pub fn load_model(&self, key: &str) -> PipelineResult<LinearModel> {
        Ok(self.load_artifact(key)?.model())
    }

    pub fn load_artifact(&self, key: &str) -> PipelineResult<ModelArtifact> {
        let bytes = self.store.get(key)?;
        let artifact = ModelArtifact::decode(&bytes, key)?;
        log::info!("loaded model from {key}");
        Ok(artifact)
    }

    /// Fit on `dataset_key` and persist the result under `model_key`.
    pub fn train(&self, dataset_key: &str, model_key: &str) -> PipelineResult<TrainReport> {
        let dataset = self.load_dataset(dataset_key)?;
        let (train, test) = self.split(&dataset)?;
        let model = self.fit(&train)?;

        let train_eval = evaluate(&model, &train)?;
        let test_eval = evaluate(&model, &test)?;
        log::info!(
            "R² train {:.4}, test {:.4}",
            train_eval.r2,
            test_eval.r2
        );

        let artifact = ModelArtifact::new(&model, model_key)
            .with_provenance(dataset_key, train.n_samples())
            .with_scores(train_eval.r2, test_eval.r2);
        self.save_artifact(&artifact)?;

        Ok(TrainReport {
            model,
            key: model_key.to_string(),
            dataset: dataset_key.to_string(),
            train: train_eval,
            test: test_eval,
        })
    }

    /// Score the model at `model_key` on `new_dataset_key`; retrain into
    /// `retrain_key` if the policy rejects it.
    pub fn monitor(
        &self,
        model_key: &str,
        new_dataset_key: &str,
        retrain_key: &str,
    ) -> PipelineResult<MonitorOutcome> {
        let model = self.load_model(model_key)?;
        let new_data = self.load_dataset(new_dataset_key)?;
        let score = self.score(&model, &new_data)?;

        if !self.policy.needs_retrain(score) {
            log::info!(
                "{model_key} scores R² {score:.4} on {new_dataset_key} (threshold {}), keeping it",
                self.policy.threshold()
            );
            return Ok(MonitorOutcome::Adequate { score });
        }

        log::info!(
            "{model_key} scores R² {score:.4} on {new_dataset_key} (threshold {}), retraining into {retrain_key}",
            self.policy.threshold()
        );
        let report = self.train(new_dataset_key, retrain_key)?;
        Ok(MonitorOutcome::Retrained {
            previous_score: score,
            report,
        })
    }

    /// Best-effort delete of prior artifacts. Failures, including keys
    /// that do not exist, are logged and skipped. Returns how many keys
    /// were actually deleted.
    pub fn cleanup<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        let mut deleted = 0;
        for key in keys {
            let key = key.as_ref();
            match self.store.delete(key) {
                Ok(()) => {
                    log::info!("deleted prior artifact {key}");
                    deleted += 1;
                }
                Err(e) => log::warn!("cleanup skipped {key}: {e}"),
            }
        }
        deleted
    }

    /// Full run: optional cleanup, train v1 on the initial dataset, then
    /// check v1 against the new dataset and retrain into v2 if needed.
    pub fn run(&self) -> PipelineResult<RunSummary> {
        let v1 = model_key(&self.config.model_prefix, 1);
        let v2 = model_key(&self.config.model_prefix, 2);

        let cleaned = if self.config.clean_start {
            self.cleanup(&[&v1, &v2])
        } else {
            0
        };

        let initial = self.train(&self.config.dataset_key, &v1)?;
        let outcome = self.monitor(&v1, &self.config.new_dataset_key, &v2)?;

        Ok(RunSummary {
            cleaned,
            initial,
            outcome,
        })
    }
}
