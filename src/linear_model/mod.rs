//! Univariate least-squares regression.
//!
//! `LinearRegression` is the estimator; fitting it yields an immutable
//! `LinearModel` holding exactly a slope and an intercept.
//!
//! # Examples
//!
//! ```rust
//! use regress_pipeline::{Dataset, LinearRegression};
//! use ndarray::array;
//!
//! let data = Dataset::new(array![1.0, 2.0, 3.0], array![2.0, 4.0, 6.0]).unwrap();
//!
//! let model = LinearRegression::new().fit(&data).unwrap();
//! let predictions = model.predict(&array![4.0]);
//! assert!((predictions[0] - 8.0).abs() < 1e-10);
//! assert_eq!(model.score(&data).unwrap(), 1.0);
//! ```

mod linear_regression;

pub use linear_regression::{LinearModel, LinearRegression};
