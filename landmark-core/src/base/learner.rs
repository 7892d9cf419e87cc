//! Learner.
use crate::record::Record;
use anyhow::Result;

/// Consumes training batches, typically a Q-network with its optimizer.
///
/// The gradient computation is provided by the training framework.
pub trait Learner {
    /// Batch consumed in an optimization step.
    type Batch;

    /// Performs an optimization step and returns values to be recorded,
    /// like the loss.
    fn opt(&mut self, batch: Self::Batch) -> Result<Record>;
}
