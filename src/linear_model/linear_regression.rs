use crate::Vector;
use crate::dataset::Dataset;
use crate::error::{PipelineError, PipelineResult};

/// A fitted line `response = slope * predictor + intercept`.
///
/// Only [`LinearRegression::fit`] and artifact decoding produce one; the
/// parameters cannot be edited afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearModel {
    slope: f64,
    intercept: f64,
}

impl LinearModel {
    pub(crate) fn from_parts(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn predict(&self, x: &Vector) -> Vector {
        x.mapv(|v| self.slope * v + self.intercept)
    }

    /// R² of this model's predictions against the dataset's response.
    pub fn score(&self, dataset: &Dataset) -> PipelineResult<f64> {
        let y_pred = self.predict(dataset.predictor());
        crate::metrics::r2_score(dataset.response(), &y_pred)
    }
}

/// Ordinary least squares on a single predictor column.
#[derive(Clone, Debug)]
pub struct LinearRegression {
    fit_intercept: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
        }
    }

    /// With `false` the line is forced through the origin.
    pub fn with_intercept(fit_intercept: bool) -> Self {
        Self { fit_intercept }
    }

    pub fn fit(&self, dataset: &Dataset) -> PipelineResult<LinearModel> {
        self.fit_arrays(dataset.predictor(), dataset.response())
    }

    pub fn fit_arrays(&self, x: &Vector, y: &Vector) -> PipelineResult<LinearModel> {
        if x.len() != y.len() {
            return Err(PipelineError::value(
                "Number of samples in x and y must match",
            ));
        }

        if x.is_empty() {
            return Err(PipelineError::value("cannot fit on an empty dataset"));
        }

        // Exact comparison: any tolerance here would depend on the data's scale.
        let degenerate = if self.fit_intercept {
            x.iter().all(|&v| v == x[0])
        } else {
            x.iter().all(|&v| v == 0.0)
        };
        if degenerate {
            return Err(PipelineError::value(
                "degenerate fit: predictor has zero variance",
            ));
        }

        let (slope, intercept) = if self.fit_intercept {
            self.fit_with_intercept(x, y)?
        } else {
            (self.fit_without_intercept(x, y)?, 0.0)
        };

        if !(slope.is_finite() && intercept.is_finite()) {
            return Err(PipelineError::value(format!(
                "fit produced non-finite parameters (slope {slope}, intercept {intercept})"
            )));
        }

        Ok(LinearModel::from_parts(slope, intercept))
    }

    fn fit_with_intercept(&self, x: &Vector, y: &Vector) -> PipelineResult<(f64, f64)> {
        let n = x.len() as f64;
        let x_mean = x.sum() / n;
        let y_mean = y.sum() / n;

        let x_centered = x - x_mean;
        let y_centered = y - y_mean;

        let slope = self.analytical_solution(&x_centered, &y_centered)?;
        let intercept = y_mean - slope * x_mean;

        Ok((slope, intercept))
    }

    fn fit_without_intercept(&self, x: &Vector, y: &Vector) -> PipelineResult<f64> {
        self.analytical_solution(x, y)
    }

    fn analytical_solution(&self, x: &Vector, y: &Vector) -> PipelineResult<f64> {
        let xx = x.dot(x);
        let xy = x.dot(y);

        if xx == 0.0 || !xx.is_finite() {
            return Err(PipelineError::value(format!(
                "sum of squared predictor deviations is out of range ({xx})"
            )));
        }

        Ok(xy / xx)
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::synthetic;
    use ndarray::array;

    fn dataset(x: Vector, y: Vector) -> Dataset {
        Dataset::new(x, y).unwrap()
    }

    #[test]
    fn test_linear_regression_simple() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![5.0, 7.0, 9.0, 11.0];

        let model = LinearRegression::new().fit(&dataset(x.clone(), y.clone())).unwrap();
        assert!((model.slope() - 2.0).abs() < 1e-10);
        assert!((model.intercept() - 3.0).abs() < 1e-10);

        let predictions = model.predict(&x);
        for (pred, actual) in predictions.iter().zip(y.iter()) {
            assert!((pred - actual).abs() < 1e-10);
        }
    }

    #[test]
    fn test_linear_regression_without_intercept() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let model = LinearRegression::with_intercept(false)
            .fit(&dataset(x, y))
            .unwrap();

        assert!((model.slope() - 2.0).abs() < 1e-10);
        assert_eq!(model.intercept(), 0.0);
    }

    #[test]
    fn test_matches_closed_form_on_noisy_data() {
        let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = array![5.1, 6.9, 9.2, 11.1, 12.8];

        let model = LinearRegression::new().fit(&dataset(x, y)).unwrap();
        // Sxy = 19.6, Sxx = 10
        assert!((model.slope() - 1.96).abs() < 1e-10);
        assert!((model.intercept() - 3.14).abs() < 1e-10);
    }

    #[test]
    fn test_zero_variance_predictor() {
        let err = LinearRegression::new()
            .fit(&dataset(array![3.0, 3.0, 3.0], array![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = LinearRegression::new()
            .fit(&dataset(array![7.0], array![1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_constant_predictor_at_large_magnitude() {
        let x = Vector::from_elem(3, 1e15 + 0.3);
        let err = LinearRegression::new()
            .fit(&dataset(x, array![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = LinearRegression::with_intercept(false)
            .fit(&dataset(Vector::zeros(3), array![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_small_scale_predictor_fits() {
        let x = array![0.0, 1e-6, 2e-6, 3e-6];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let model = LinearRegression::new().fit(&dataset(x, y)).unwrap();
        assert!((model.slope() - 1e6).abs() < 1e-3);
        assert!(model.intercept().abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_predictor_is_rejected() {
        let x = array![0.0, 1e160, 2e160];
        for y in [x.clone(), array![1.0, 2.0, 3.0]] {
            let err = LinearRegression::new()
                .fit(&dataset(x.clone(), y))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Value);
        }
    }

    #[test]
    fn test_empty_and_mismatched_input() {
        let model = LinearRegression::new();
        assert!(model.fit_arrays(&Vector::zeros(0), &Vector::zeros(0)).is_err());
        assert!(model.fit_arrays(&array![1.0, 2.0], &array![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_score_never_exceeds_one() {
        for seed in 0..10 {
            let data = synthetic::linear(40, 1.5, -2.0, 3.0, seed).unwrap();
            let model = LinearRegression::new().fit(&data).unwrap();
            let r2 = model.score(&data).unwrap();
            assert!(r2 <= 1.0, "seed {seed}: r2 {r2}");
            assert!(r2 < 1.0, "noisy data cannot be fitted exactly");
        }

        let exact = dataset(array![1.0, 2.0, 3.0], array![2.0, 4.0, 6.0]);
        let model = LinearRegression::new().fit(&exact).unwrap();
        assert_eq!(model.score(&exact).unwrap(), 1.0);
    }
}
