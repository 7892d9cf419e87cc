//! Running statistics of scalar values.
use crate::error::LandmarkError;

/// Accumulates scalar values fed one at a time.
///
/// Used for episode scores, distance errors and game counters.
/// Queries other than [`StatCounter::count`] and [`StatCounter::sum`] fail on
/// an empty counter.
#[derive(Clone, Debug, Default)]
pub struct StatCounter {
    values: Vec<f32>,
}

impl StatCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn feed(&mut self, v: f32) {
        self.values.push(v);
    }

    /// Removes all values.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Number of values fed since the last reset.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Sum of the values, `0` if empty.
    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }

    /// Mean of the values.
    pub fn average(&self) -> Result<f32, LandmarkError> {
        if self.values.is_empty() {
            return Err(LandmarkError::EmptyStatCounter);
        }
        Ok(self.sum() / self.values.len() as f32)
    }

    /// Largest value.
    pub fn max(&self) -> Result<f32, LandmarkError> {
        self.values
            .iter()
            .copied()
            .max_by(|x, y| x.total_cmp(y))
            .ok_or(LandmarkError::EmptyStatCounter)
    }

    /// Smallest value.
    pub fn min(&self) -> Result<f32, LandmarkError> {
        self.values
            .iter()
            .copied()
            .min_by(|x, y| x.total_cmp(y))
            .ok_or(LandmarkError::EmptyStatCounter)
    }
}
