//! Errors of the experience replay data flow.
use thiserror::Error;

/// Errors of the experience replay data flow.
#[derive(Error, Debug)]
pub enum AsyncTrainerError {
    /// The replay memory holds too few transitions to draw a batch.
    #[error("Replay memory of {len} transitions is too small to sample from index {min_index}")]
    InsufficientMemory {
        /// Number of transitions in the replay memory.
        len: usize,
        /// Smallest logical index a batch is drawn from.
        min_index: usize,
    },

    /// The simulator thread is gone, so no more transitions will arrive.
    #[error("Simulator thread stopped")]
    SimulatorStopped,

    /// The simulator was already moved into its thread.
    #[error("Simulator already started")]
    SimulatorStarted,
}
