//! Persisted form of a fitted model.
//!
//! Artifacts are JSON documents. Floats are written in shortest
//! round-trip form and parsed back exactly, so a saved model reloads with
//! bit-identical parameters.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::linear_model::LinearModel;

/// Current artifact layout version.
pub const ARTIFACT_FORMAT: u32 = 1;

const ARTIFACT_FILE: &str = "model.json";

/// Versioned storage key for a model generation, e.g. `params/v2/model.json`.
pub fn model_key(prefix: &str, version: u32) -> String {
    format!("{}/v{version}/{ARTIFACT_FILE}", prefix.trim_end_matches('/'))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    format: u32,
    slope: f64,
    intercept: f64,
    /// Key the artifact was written under.
    key: String,
    /// Location of the dataset the model was fitted on.
    dataset: Option<String>,
    train_rows: Option<usize>,
    train_r2: Option<f64>,
    test_r2: Option<f64>,
}

impl ModelArtifact {
    pub fn new(model: &LinearModel, key: &str) -> Self {
        Self {
            format: ARTIFACT_FORMAT,
            slope: model.slope(),
            intercept: model.intercept(),
            key: key.to_string(),
            dataset: None,
            train_rows: None,
            train_r2: None,
            test_r2: None,
        }
    }

    pub fn with_provenance(mut self, dataset: &str, train_rows: usize) -> Self {
        self.dataset = Some(dataset.to_string());
        self.train_rows = Some(train_rows);
        self
    }

    pub fn with_scores(mut self, train_r2: f64, test_r2: f64) -> Self {
        self.train_r2 = Some(train_r2).filter(|v| v.is_finite());
        self.test_r2 = Some(test_r2).filter(|v| v.is_finite());
        self
    }

    pub fn model(&self) -> LinearModel {
        LinearModel::from_parts(self.slope, self.intercept)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn train_rows(&self) -> Option<usize> {
        self.train_rows
    }

    pub fn train_r2(&self) -> Option<f64> {
        self.train_r2
    }

    pub fn test_r2(&self) -> Option<f64> {
        self.test_r2
    }

    pub fn encode(&self) -> PipelineResult<Vec<u8>> {
        if !(self.slope.is_finite() && self.intercept.is_finite()) {
            return Err(PipelineError::value(format!(
                "refusing to persist non-finite parameters (slope {}, intercept {})",
                self.slope, self.intercept
            )));
        }
        serde_json::to_vec_pretty(self)
            .map_err(|e| PipelineError::value(format!("encoding model artifact: {e}")))
    }

    /// Decode bytes read from `key`.
    pub fn decode(bytes: &[u8], key: &str) -> PipelineResult<Self> {
        let corrupt = |reason: String| PipelineError::Deserialization {
            key: key.to_string(),
            reason,
        };

        let artifact: Self = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        if artifact.format != ARTIFACT_FORMAT {
            return Err(corrupt(format!(
                "unsupported artifact format {} (expected {ARTIFACT_FORMAT})",
                artifact.format
            )));
        }
        if !(artifact.slope.is_finite() && artifact.intercept.is_finite()) {
            return Err(corrupt("non-finite model parameters".to_string()));
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_model_key() {
        assert_eq!(model_key("params", 1), "params/v1/model.json");
        assert_eq!(model_key("models/housing/", 12), "models/housing/v12/model.json");
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        let awkward = [
            (0.1 + 0.2, -1.0 / 3.0),
            (std::f64::consts::PI, 1e-300),
            (-123456.789e10, f64::MIN_POSITIVE),
            (5e-324, -0.0),
        ];
        for (slope, intercept) in awkward {
            let model = LinearModel::from_parts(slope, intercept);
            let bytes = ModelArtifact::new(&model, "params/v1/model.json")
                .with_provenance("data/a.csv", 8)
                .with_scores(0.97, 0.91)
                .encode()
                .unwrap();

            let decoded = ModelArtifact::decode(&bytes, "params/v1/model.json").unwrap();
            let back = decoded.model();
            assert_eq!(back.slope().to_bits(), slope.to_bits());
            assert_eq!(back.intercept().to_bits(), intercept.to_bits());
            assert_eq!(decoded.train_r2(), Some(0.97));
            assert_eq!(decoded.train_rows(), Some(8));
            assert_eq!(decoded.dataset(), Some("data/a.csv"));
        }
    }

    #[test]
    fn test_decode_rejects_corrupt_bytes() {
        let cases: [&[u8]; 4] = [
            b"",
            b"\x00\x01garbage",
            br#"{"format":1,"slope":1.0}"#,
            br#"{"format":2,"slope":1.0,"intercept":0.0,"key":"k"}"#,
        ];
        for bytes in cases {
            let err = ModelArtifact::decode(bytes, "params/v1/model.json").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Deserialization);
        }
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let model = LinearModel::from_parts(f64::NAN, 0.0);
        let err = ModelArtifact::new(&model, "k").encode().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }
}
