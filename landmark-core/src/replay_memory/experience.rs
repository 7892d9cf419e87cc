use ndarray::ArrayD;

/// One environment step: the observation before the action, the action, its
/// reward and whether it ended the episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Experience {
    /// Observation the action was taken on.
    pub state: ArrayD<u8>,

    /// Action index.
    pub action: i32,

    /// Reward of the action.
    pub reward: f32,

    /// `true` for the last transition of an episode.
    pub is_over: bool,
}

impl Experience {
    /// Creates an experience.
    pub fn new(state: ArrayD<u8>, action: i32, reward: f32, is_over: bool) -> Self {
        Self {
            state,
            action,
            reward,
            is_over,
        }
    }
}
