//! Experience replay running a simulator thread next to the learner.
//!
//! # Messages
//! * From the batch iterator to the simulator thread
//!   - [`PopulateJob`], one per consumed batch, through a bounded channel
//! * From [`ExpReplay::init_memory`] to the batch iterator
//!   - the [`InitGate`] opens once the initial transitions are collected
mod error;
mod exp_replay;
mod gate;
mod messages;
mod util;
pub use error::AsyncTrainerError;
pub use exp_replay::{BatchIter, ExpReplay, ExpReplayConfig};
pub use gate::InitGate;
pub use messages::PopulateJob;
pub use util::train_dqn;
