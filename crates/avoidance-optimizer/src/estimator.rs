//! Value estimators
//!
//! The optimization loop only needs `predict` and `fit`; any numerical
//! function approximator satisfying [`ValueEstimator`] works, which is how
//! the loop is tested with deterministic stubs. The shipped implementation
//! is a small feed-forward network over nalgebra matrices with JSON
//! checkpoint persistence.

use crate::{OptimizerError, Result, ACTION_COUNT, STATE_SIZE};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// Expected reward per action for a given state
pub trait ValueEstimator {
    fn predict(&self, state: &[f64; STATE_SIZE]) -> [f64; ACTION_COUNT];
    fn fit(&mut self, states: &[[f64; STATE_SIZE]], targets: &[[f64; ACTION_COUNT]]);
}

const HIDDEN_1: usize = 128;
const HIDDEN_2: usize = 64;

/// State positions arrive in meters; the network operates in megameters.
const INPUT_SCALE: f64 = 1.0e-6;

/// Feed-forward value network: 6 -> 128 -> 64 -> 5, ReLU hidden layers,
/// linear output, batch-averaged SGD on mean squared error.
#[derive(Debug, Clone)]
pub struct ValueNetwork {
    w1: DMatrix<f64>,
    b1: DVector<f64>,
    w2: DMatrix<f64>,
    b2: DVector<f64>,
    w3: DMatrix<f64>,
    b3: DVector<f64>,
    learning_rate: f64,
}

/// Serialized network weights
#[derive(Serialize, Deserialize)]
struct NetworkCheckpoint {
    w1: DMatrix<f64>,
    b1: DVector<f64>,
    w2: DMatrix<f64>,
    b2: DVector<f64>,
    w3: DMatrix<f64>,
    b3: DVector<f64>,
}

fn uniform_layer(rng: &mut StdRng, rows: usize, cols: usize) -> DMatrix<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-limit..=limit))
}

impl ValueNetwork {
    pub fn new(learning_rate: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            w1: uniform_layer(&mut rng, HIDDEN_1, STATE_SIZE),
            b1: DVector::zeros(HIDDEN_1),
            w2: uniform_layer(&mut rng, HIDDEN_2, HIDDEN_1),
            b2: DVector::zeros(HIDDEN_2),
            w3: uniform_layer(&mut rng, ACTION_COUNT, HIDDEN_2),
            b3: DVector::zeros(ACTION_COUNT),
            learning_rate,
        }
    }

    /// Load a checkpoint, or fall back to a fresh network. A missing file is
    /// the normal first-run path; an unreadable or mis-shaped checkpoint is
    /// logged and discarded.
    pub fn load_or_fresh(path: &Path, learning_rate: f64, seed: u64) -> Self {
        match Self::load(path, learning_rate) {
            Ok(network) => {
                info!(path = %path.display(), "loaded estimator checkpoint");
                network
            }
            Err(OptimizerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no estimator checkpoint found, starting fresh");
                Self::new(learning_rate, seed)
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "discarding unusable checkpoint, starting fresh");
                Self::new(learning_rate, seed)
            }
        }
    }

    pub fn load(path: &Path, learning_rate: f64) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let checkpoint: NetworkCheckpoint = serde_json::from_reader(reader)?;

        let expected = [
            ("w1", checkpoint.w1.shape(), (HIDDEN_1, STATE_SIZE)),
            ("w2", checkpoint.w2.shape(), (HIDDEN_2, HIDDEN_1)),
            ("w3", checkpoint.w3.shape(), (ACTION_COUNT, HIDDEN_2)),
            ("b1", (checkpoint.b1.len(), 1), (HIDDEN_1, 1)),
            ("b2", (checkpoint.b2.len(), 1), (HIDDEN_2, 1)),
            ("b3", (checkpoint.b3.len(), 1), (ACTION_COUNT, 1)),
        ];
        for (name, actual, wanted) in expected {
            if actual != wanted {
                return Err(OptimizerError::CheckpointShape(format!(
                    "{name} is {actual:?}, expected {wanted:?}"
                )));
            }
        }

        Ok(Self {
            w1: checkpoint.w1,
            b1: checkpoint.b1,
            w2: checkpoint.w2,
            b2: checkpoint.b2,
            w3: checkpoint.w3,
            b3: checkpoint.b3,
            learning_rate,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let checkpoint = NetworkCheckpoint {
            w1: self.w1.clone(),
            b1: self.b1.clone(),
            w2: self.w2.clone(),
            b2: self.b2.clone(),
            w3: self.w3.clone(),
            b3: self.b3.clone(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &checkpoint)?;
        info!(path = %path.display(), "saved estimator checkpoint");
        Ok(())
    }

    fn input(state: &[f64; STATE_SIZE]) -> DVector<f64> {
        DVector::from_iterator(STATE_SIZE, state.iter().map(|v| v * INPUT_SCALE))
    }

    fn forward(&self, x: &DVector<f64>) -> (DVector<f64>, DVector<f64>, DVector<f64>) {
        let h1 = (&self.w1 * x + &self.b1).map(|v| v.max(0.0));
        let h2 = (&self.w2 * &h1 + &self.b2).map(|v| v.max(0.0));
        let out = &self.w3 * &h2 + &self.b3;
        (h1, h2, out)
    }
}

impl ValueEstimator for ValueNetwork {
    fn predict(&self, state: &[f64; STATE_SIZE]) -> [f64; ACTION_COUNT] {
        let (_, _, out) = self.forward(&Self::input(state));
        let mut values = [0.0; ACTION_COUNT];
        for (value, output) in values.iter_mut().zip(out.iter()) {
            *value = *output;
        }
        values
    }

    fn fit(&mut self, states: &[[f64; STATE_SIZE]], targets: &[[f64; ACTION_COUNT]]) {
        if states.is_empty() || states.len() != targets.len() {
            return;
        }

        let mut grad_w1 = DMatrix::zeros(HIDDEN_1, STATE_SIZE);
        let mut grad_b1 = DVector::zeros(HIDDEN_1);
        let mut grad_w2 = DMatrix::zeros(HIDDEN_2, HIDDEN_1);
        let mut grad_b2 = DVector::zeros(HIDDEN_2);
        let mut grad_w3 = DMatrix::zeros(ACTION_COUNT, HIDDEN_2);
        let mut grad_b3 = DVector::zeros(ACTION_COUNT);

        for (state, target) in states.iter().zip(targets) {
            let x = Self::input(state);
            let (h1, h2, out) = self.forward(&x);
            let wanted = DVector::from_row_slice(target);

            let d3 = out - wanted;
            grad_w3 += &d3 * h2.transpose();
            grad_b3 += &d3;

            let mask2 = h2.map(|v| if v > 0.0 { 1.0 } else { 0.0 });
            let d2 = (self.w3.transpose() * &d3).component_mul(&mask2);
            grad_w2 += &d2 * h1.transpose();
            grad_b2 += &d2;

            let mask1 = h1.map(|v| if v > 0.0 { 1.0 } else { 0.0 });
            let d1 = (self.w2.transpose() * &d2).component_mul(&mask1);
            grad_w1 += &d1 * x.transpose();
            grad_b1 += &d1;
        }

        let step = self.learning_rate / states.len() as f64;
        self.w1 -= grad_w1 * step;
        self.b1 -= grad_b1 * step;
        self.w2 -= grad_w2 * step;
        self.b2 -= grad_b2 * step;
        self.w3 -= grad_w3 * step;
        self.b3 -= grad_b3 * step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> [f64; STATE_SIZE] {
        [2.0e6, -1.0e6, 5.0e5, 1.9e6, -1.1e6, 5.2e5]
    }

    #[test]
    fn test_predict_is_finite_and_deterministic() {
        let network = ValueNetwork::new(0.001, 7);
        let first = network.predict(&sample_state());
        let second = network.predict(&sample_state());
        assert_eq!(first, second);
        assert!(first.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_clone_predicts_identically() {
        let network = ValueNetwork::new(0.001, 7);
        let copy = network.clone();
        assert_eq!(network.predict(&sample_state()), copy.predict(&sample_state()));
    }

    #[test]
    fn test_fit_reduces_error_on_fixed_target() {
        let mut network = ValueNetwork::new(0.001, 7);
        let state = sample_state();
        let target = [10.0, -100.0, -100.0, -100.0, -100.0];

        let error = |net: &ValueNetwork| -> f64 {
            net.predict(&state)
                .iter()
                .zip(target.iter())
                .map(|(p, t)| (p - t) * (p - t))
                .sum()
        };

        let before = error(&network);
        for _ in 0..300 {
            network.fit(&[state], &[target]);
        }
        let after = error(&network);
        assert!(after < before, "error {before} -> {after}");
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimator.json");

        let network = ValueNetwork::new(0.001, 7);
        network.save(&path).unwrap();

        let restored = ValueNetwork::load(&path, 0.001).unwrap();
        assert_eq!(network.predict(&sample_state()), restored.predict(&sample_state()));
    }

    #[test]
    fn test_corrupt_checkpoint_falls_back_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimator.json");
        std::fs::write(&path, "{ not json ").unwrap();

        assert!(ValueNetwork::load(&path, 0.001).is_err());
        let network = ValueNetwork::load_or_fresh(&path, 0.001, 7);
        assert!(network.predict(&sample_state()).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_checkpoint_falls_back_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        let network = ValueNetwork::load_or_fresh(&path, 0.001, 7);
        assert!(network.predict(&sample_state()).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mismatched_shape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimator.json");

        // Hand-build a checkpoint with the wrong output width
        let bogus = NetworkCheckpoint {
            w1: DMatrix::zeros(HIDDEN_1, STATE_SIZE),
            b1: DVector::zeros(HIDDEN_1),
            w2: DMatrix::zeros(HIDDEN_2, HIDDEN_1),
            b2: DVector::zeros(HIDDEN_2),
            w3: DMatrix::zeros(3, HIDDEN_2),
            b3: DVector::zeros(3),
        };
        let writer = BufWriter::new(File::create(&path).unwrap());
        serde_json::to_writer(writer, &bogus).unwrap();

        assert!(matches!(
            ValueNetwork::load(&path, 0.001),
            Err(OptimizerError::CheckpointShape(_))
        ));
    }
}
