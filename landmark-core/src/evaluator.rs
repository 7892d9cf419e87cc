//! Evaluation of predictors by greedy play.
//!
//! [`play_one_episode`] plays a single episode with the greedy action of a
//! [`Predictor`](crate::Predictor). [`eval_with_predictors`] runs episodes on
//! several worker threads and aggregates the scores and distance errors into
//! [`EvalStats`]. The [`Evaluator`] callback does this periodically during
//! training.
mod base;
mod callback;
mod episode;
pub use base::{eval_model_multithread, eval_with_predictors, EvalStats};
pub use callback::Evaluator;
pub use episode::{play_n_episodes, play_one_episode, EpisodeResult, FrameHistory};
