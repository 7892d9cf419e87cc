//! Player, the environment of landmark localization.
use crate::StatCounter;
use anyhow::Result;
use ndarray::ArrayD;

/// Additional information emitted with every [`PlayerStep`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepInfo {
    /// Accumulated score of the current episode.
    pub score: f32,

    /// Distance between the agent location and the target landmark.
    pub dist_error: f32,

    /// File name of the scan being played.
    pub filename: String,

    /// Location of the agent in image index space.
    pub location: [f32; 3],
}

/// Result of [`Player::step`].
#[derive(Clone, Debug)]
pub struct PlayerStep {
    /// Observation after the action.
    pub ob: ArrayD<u8>,

    /// Reward of the action.
    pub reward: f32,

    /// Flag denoting the end of an episode.
    pub is_over: bool,

    /// Information about the episode.
    pub info: StepInfo,
}

/// An agent moving inside a 3D scan towards a landmark.
///
/// Image decoding and the movement rules live in the implementation, which
/// is out of scope of this crate.
pub trait Player {
    /// Number of legal actions.
    fn num_actions(&self) -> usize;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<ArrayD<u8>>;

    /// Applies an action.
    ///
    /// `q_values` are the action values the action was chosen from; players
    /// may use them for visualization or termination heuristics. They are
    /// all zeros for random actions.
    fn step(&mut self, act: usize, q_values: &[f32]) -> Result<PlayerStep>;

    /// Counter of finished games.
    fn num_games(&self) -> &StatCounter;

    /// Counter of games in which the landmark was reached.
    fn num_success(&self) -> &StatCounter;

    /// Resets [`Player::num_games`] and [`Player::num_success`].
    fn reset_stat(&mut self);
}
