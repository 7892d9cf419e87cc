//! Lifecycle hooks invoked by the training loop host.
use crate::record::Recorder;
use anyhow::Result;

/// Hooks a [`Trainer`](crate::Trainer) invokes at fixed points of training.
///
/// The order is `setup` for every callback, then `before_train` for every
/// callback, then `trigger` periodically during the loop and `after_train`
/// once the loop ends.
pub trait Callback {
    /// Called once before anything else, e.g. to acquire predictors.
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once right before the first optimization step.
    fn before_train(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called every `trigger_interval` optimization steps.
    ///
    /// `opt_steps` is the number of optimization steps done so far.
    #[allow(unused_variables)]
    fn trigger(&mut self, opt_steps: usize, recorder: &mut dyn Recorder) -> Result<()> {
        Ok(())
    }

    /// Called once after the training loop.
    fn after_train(&mut self) -> Result<()> {
        Ok(())
    }
}
