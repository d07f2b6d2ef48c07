use crate::Vector;
use crate::error::{PipelineError, PipelineResult};

fn check_lengths(y_true: &Vector, y_pred: &Vector) -> PipelineResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::value(format!(
            "y_true and y_pred must have the same length ({} != {})",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::value("cannot score an empty dataset"));
    }
    Ok(())
}

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(|x| x * x).sum() / y_true.len() as f64)
}

pub fn mean_absolute_error(y_true: &Vector, y_pred: &Vector) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(f64::abs).sum() / y_true.len() as f64)
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Not clamped: a model worse than predicting the mean scores below zero.
/// A constant `y_true` has no variance to explain, so it scores 1.0 when
/// matched exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;

    // The mean of a constant column is not always exact, so check the values.
    let first = y_true[0];
    if y_true.iter().all(|&v| v == first) {
        let exact = y_true.iter().zip(y_pred.iter()).all(|(t, p)| t == p);
        return Ok(if exact { 1.0 } else { 0.0 });
    }

    let y_mean = y_true.sum() / y_true.len() as f64;
    let ss_res = (y_true - y_pred).mapv(|x| x * x).sum();
    let ss_tot = y_true.mapv(|x| (x - y_mean) * (x - y_mean)).sum();

    Ok(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_squared_error() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![1.0, 2.0, 3.0];

        let mse = mean_squared_error(&y_true, &y_pred).unwrap();
        assert!((mse - 0.0).abs() < 1e-10);

        let y_pred = array![2.0, 2.0, 5.0];
        let mse = mean_squared_error(&y_true, &y_pred).unwrap();
        assert!((mse - 5.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_mean_absolute_error() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 1.0, 4.0];

        let mae = mean_absolute_error(&y_true, &y_pred).unwrap();
        assert!((mae - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_r2_score() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 4.0];

        let r2 = r2_score(&y_true, &y_pred).unwrap();
        assert!((r2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_r2_mean_prediction_is_zero() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.5, 2.5, 2.5, 2.5];

        let r2 = r2_score(&y_true, &y_pred).unwrap();
        assert!(r2.abs() < 1e-12);
    }

    #[test]
    fn test_r2_is_not_clamped() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![4.0, 3.0, 2.0, 1.0];

        let r2 = r2_score(&y_true, &y_pred).unwrap();
        assert!((r2 - (-3.0)).abs() < 1e-10);
    }

    #[test]
    fn test_r2_constant_target() {
        let y_true = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(&y_true, &array![2.0, 2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&y_true, &array![1.0, 2.0, 3.0]).unwrap(), 0.0);

        let y_true = array![0.1, 0.1, 0.1];
        assert_eq!(r2_score(&y_true, &array![0.1, 0.1, 0.1]).unwrap(), 1.0);
        assert_eq!(r2_score(&y_true, &array![0.1, 0.1, 0.1000000001]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(r2_score(&array![1.0, 2.0], &array![1.0]).is_err());
        assert!(mean_squared_error(&Vector::zeros(0), &Vector::zeros(0)).is_err());
    }
}
