#![warn(missing_docs)]
//! Core of a deep Q-learning toolkit for anatomical landmark localization.
//!
//! The central piece is [`ReplayMemory`](replay_memory::ReplayMemory), a
//! fixed-capacity ring buffer of transitions that reconstructs stacks of
//! consecutive frames without leaking frames across episode boundaries.
//! Around it live the interfaces to the external collaborators
//! ([`Player`], [`Predictor`], [`Learner`]), metric recording
//! ([`record`]), a multi-threaded [`evaluator`], landmark file readers
//! ([`landmark`]) and a small training loop host ([`Trainer`]).
pub mod dummy;
pub mod error;
pub mod evaluator;
pub mod landmark;
pub mod record;
pub mod replay_memory;

mod base;
pub use base::{
    argmax, Callback, ExperienceBufferBase, Learner, Player, PlayerStep, Predictor, StepInfo,
};

mod stat;
pub use stat::StatCounter;

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
