use ndarray::ArrayD;

/// A single training sample taken from [`ReplayMemory`](super::ReplayMemory).
#[derive(Clone, Debug)]
pub struct Sample {
    /// Stacked frames with shape `state_shape + (history_len + 1,)`.
    ///
    /// The first `history_len` frames form the state, the last
    /// `history_len` frames the next state.
    pub state: ArrayD<u8>,

    /// Reward of the current step.
    pub reward: f32,

    /// Action of the current step.
    pub action: i32,

    /// Terminal flag of the current step.
    pub is_over: bool,
}

/// Samples stacked along a leading batch axis.
#[derive(Clone, Debug)]
pub struct TransitionBatch {
    /// Stacked frames with shape `(batch,) + state_shape + (history_len + 1,)`.
    pub states: ArrayD<u8>,

    /// Actions.
    pub actions: Vec<i32>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Terminal flags.
    pub is_over: Vec<bool>,
}

impl TransitionBatch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}
