use crate::Vector;
use crate::error::{PipelineError, PipelineResult};
use ndarray::Axis;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Two numeric columns read from one storage location.
///
/// There is no mutable access once built; splitting produces new datasets
/// that remember the location they came from.
#[derive(Clone, Debug)]
pub struct Dataset {
    predictor: Vector,
    response: Vector,
    predictor_name: String,
    response_name: String,
    source: String,
}

impl Dataset {
    pub fn new(predictor: Vector, response: Vector) -> PipelineResult<Self> {
        if predictor.len() != response.len() {
            return Err(PipelineError::value(format!(
                "predictor has {} rows but response has {}",
                predictor.len(),
                response.len()
            )));
        }

        Ok(Self {
            predictor,
            response,
            predictor_name: "x".to_string(),
            response_name: "y".to_string(),
            source: "<memory>".to_string(),
        })
    }

    pub fn with_columns(mut self, predictor: &str, response: &str) -> Self {
        self.predictor_name = predictor.to_string();
        self.response_name = response.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Decode a CSV object with a header row, keeping only the two named
    /// columns. Any other column is ignored.
    pub fn from_csv(
        bytes: &[u8],
        location: &str,
        predictor: &str,
        response: &str,
    ) -> PipelineResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::malformed(location, format!("reading header: {e}")))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::malformed(location, format!("missing column `{name}`")))
        };
        let x_idx = column(predictor)?;
        let y_idx = column(response)?;

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| PipelineError::malformed(location, format!("row {row}: {e}")))?;
            xs.push(parse_cell(record.get(x_idx), location, row, predictor)?);
            ys.push(parse_cell(record.get(y_idx), location, row, response)?);
        }

        if xs.is_empty() {
            return Err(PipelineError::malformed(location, "no data rows"));
        }

        Ok(Self::new(Vector::from(xs), Vector::from(ys))?
            .with_columns(predictor, response)
            .with_source(location))
    }

    pub fn n_samples(&self) -> usize {
        self.predictor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictor.is_empty()
    }

    pub fn predictor(&self) -> &Vector {
        &self.predictor
    }

    pub fn response(&self) -> &Vector {
        &self.response
    }

    pub fn predictor_name(&self) -> &str {
        &self.predictor_name
    }

    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.predictor.iter().copied().zip(self.response.iter().copied())
    }

    /// Seeded random partition into `(train, test)`.
    ///
    /// `train_fraction` of the rows (rounded) go to the training subset and
    /// the rest to the test subset. Each subset keeps the original row order.
    pub fn train_test_split(&self, train_fraction: f64, seed: u64) -> PipelineResult<(Self, Self)> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(PipelineError::value(format!(
                "train fraction must be between 0 and 1 (exclusive), got {train_fraction}"
            )));
        }

        let n_samples = self.n_samples();
        let n_train = (n_samples as f64 * train_fraction).round() as usize;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (train_idx, test_idx) = indices.split_at(n_train);
        let mut train_idx = train_idx.to_vec();
        let mut test_idx = test_idx.to_vec();
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        Ok((self.select(&train_idx), self.select(&test_idx)))
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            predictor: self.predictor.select(Axis(0), indices),
            response: self.response.select(Axis(0), indices),
            predictor_name: self.predictor_name.clone(),
            response_name: self.response_name.clone(),
            source: self.source.clone(),
        }
    }
}

fn parse_cell(cell: Option<&str>, location: &str, row: usize, column: &str) -> PipelineResult<f64> {
    let raw = cell.unwrap_or("");
    let value: f64 = raw.parse().map_err(|_| {
        PipelineError::malformed(location, format!("row {row}, column `{column}`: `{raw}` is not a number"))
    })?;
    if !value.is_finite() {
        return Err(PipelineError::malformed(
            location,
            format!("row {row}, column `{column}`: non-finite value `{raw}`"),
        ));
    }
    Ok(value)
}
