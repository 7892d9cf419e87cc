//! Experience replay with a simulator thread.
mod base;
mod batch_iter;
mod config;
mod simulator;
pub use base::ExpReplay;
pub use batch_iter::BatchIter;
pub use config::ExpReplayConfig;
