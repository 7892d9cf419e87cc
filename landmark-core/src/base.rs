//! Interfaces to the collaborators around the replay memory.
mod callback;
mod learner;
mod player;
mod predictor;
mod replay_buffer;
pub use callback::Callback;
pub use learner::Learner;
pub use player::{Player, PlayerStep, StepInfo};
pub use predictor::{argmax, Predictor};
pub use replay_buffer::ExperienceBufferBase;
