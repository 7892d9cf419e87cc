use crate::{argmax, replay_memory::stack_frames, Player, Predictor};
use anyhow::Result;
use log::info;
use ndarray::{ArrayD, Axis, IxDyn};
use std::collections::VecDeque;

/// Summary of a finished episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeResult {
    /// Sum of rewards.
    pub score: f32,

    /// Scan the episode was played on.
    pub filename: String,

    /// Distance to the landmark at the end of the episode.
    pub dist_error: f32,

    /// Action values of the last step.
    pub q_values: Vec<f32>,

    /// Final location of the agent.
    pub location: [f32; 3],
}

/// The last `history_len` observations of an episode.
///
/// After a reset the history holds zero frames followed by the first
/// observation.
pub struct FrameHistory {
    frames: VecDeque<ArrayD<u8>>,
    history_len: usize,
}

impl FrameHistory {
    /// Creates an empty history.
    pub fn new(history_len: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(history_len),
            history_len,
        }
    }

    /// Starts a new episode with its first observation.
    pub fn reset(&mut self, ob: ArrayD<u8>) {
        self.frames.clear();
        let zero = ArrayD::<u8>::zeros(IxDyn(ob.shape()));
        for _ in 1..self.history_len {
            self.frames.push_back(zero.clone());
        }
        self.frames.push_back(ob);
    }

    /// Adds an observation, dropping the oldest.
    pub fn push(&mut self, ob: ArrayD<u8>) {
        if self.frames.len() == self.history_len {
            self.frames.pop_front();
        }
        self.frames.push_back(ob);
    }

    /// Stacked frames with a leading batch axis of length 1, the input of
    /// [`Predictor::predict`].
    pub fn input(&self) -> Result<ArrayD<u8>> {
        let frames = self.frames.iter().cloned().collect::<Vec<_>>();
        Ok(stack_frames(&frames)?.insert_axis(Axis(0)))
    }
}

/// Plays an episode choosing the action with the largest value.
pub fn play_one_episode<L, P>(
    player: &mut L,
    predictor: &P,
    history_len: usize,
) -> Result<EpisodeResult>
where
    L: Player + ?Sized,
    P: Predictor + ?Sized,
{
    let mut history = FrameHistory::new(history_len);
    history.reset(player.reset()?);
    let mut score = 0f32;

    loop {
        let q_values = predictor.predict(&history.input()?)?;
        let act = argmax(&q_values);
        let step = player.step(act, &q_values)?;
        score += step.reward;

        if step.is_over {
            return Ok(EpisodeResult {
                score,
                filename: step.info.filename,
                dist_error: step.info.dist_error,
                q_values,
                location: step.info.location,
            });
        }
        history.push(step.ob);
    }
}

/// Plays `n` episodes one at a time, logging each result.
pub fn play_n_episodes<L, P>(
    player: &mut L,
    predictor: &P,
    history_len: usize,
    n: usize,
) -> Result<Vec<EpisodeResult>>
where
    L: Player + ?Sized,
    P: Predictor + ?Sized,
{
    info!("Start playing");
    let mut results = Vec::with_capacity(n);

    for k in 0..n {
        let r = play_one_episode(player, predictor, history_len)?;
        info!(
            "{}/{} - {} - score {} - distError {} - q_values {:?} - location {:?}",
            k + 1,
            n,
            r.filename,
            r.score,
            r.dist_error,
            r.q_values,
            r.location
        );
        results.push(r);
    }

    Ok(results)
}
