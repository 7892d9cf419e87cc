//! Predictor of action values.
use anyhow::Result;
use ndarray::ArrayD;

/// Maps a batch of stacked-history observations to action values.
///
/// The input has a leading batch axis of length 1 followed by the state
/// shape and the history axis. The network behind it is provided by the
/// training framework.
pub trait Predictor: Send + Sync {
    /// Returns the action values of the first element of the batch.
    fn predict(&self, input: &ArrayD<u8>) -> Result<Vec<f32>>;
}

impl<P: Predictor + ?Sized> Predictor for std::sync::Arc<P> {
    fn predict(&self, input: &ArrayD<u8>) -> Result<Vec<f32>> {
        (**self).predict(input)
    }
}

/// Index of the largest value, the greedy action.
pub fn argmax(q_values: &[f32]) -> usize {
    q_values
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |(i_max, v_max), (i, &v)| {
            if v > v_max {
                (i, v)
            } else {
                (i_max, v_max)
            }
        })
        .0
}
