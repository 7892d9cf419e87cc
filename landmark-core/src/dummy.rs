//! This module is used for tests.
use crate::{Player, PlayerStep, Predictor, StatCounter, StepInfo};
use anyhow::{bail, Result};
use ndarray::{ArrayD, IxDyn};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Dummy player.
///
/// The agent starts `episode_len` units away from the landmark. Taking
/// `target_action` moves one unit closer with reward `1`; any other action
/// moves one unit away with reward `-1`. An episode lasts `episode_len`
/// steps and succeeds if the distance reached zero. The observation is
/// filled with the step count of the episode.
pub struct DummyPlayer {
    state_shape: Vec<usize>,
    num_actions: usize,
    episode_len: usize,
    target_action: usize,
    filename: String,
    t: usize,
    score: f32,
    dist: f32,
    num_games: StatCounter,
    num_success: StatCounter,
}

impl DummyPlayer {
    /// Creates a dummy player.
    pub fn new(state_shape: Vec<usize>, num_actions: usize, episode_len: usize) -> Self {
        Self {
            state_shape,
            num_actions,
            episode_len,
            target_action: 0,
            filename: "dummy.nii.gz".to_string(),
            t: 0,
            score: 0.0,
            dist: episode_len as f32,
            num_games: StatCounter::new(),
            num_success: StatCounter::new(),
        }
    }

    /// Sets the action moving towards the landmark.
    pub fn target_action(mut self, target_action: usize) -> Self {
        self.target_action = target_action;
        self
    }

    /// Sets the file name reported in [`StepInfo`].
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    fn ob(&self) -> ArrayD<u8> {
        ArrayD::from_elem(IxDyn(&self.state_shape), (self.t % 256) as u8)
    }
}

impl Player for DummyPlayer {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn reset(&mut self) -> Result<ArrayD<u8>> {
        self.t = 0;
        self.score = 0.0;
        self.dist = self.episode_len as f32;
        Ok(self.ob())
    }

    fn step(&mut self, act: usize, _q_values: &[f32]) -> Result<PlayerStep> {
        if act >= self.num_actions {
            bail!("Action {} out of range 0..{}", act, self.num_actions);
        }

        self.t += 1;
        let reward = if act == self.target_action {
            self.dist -= 1.0;
            1.0
        } else {
            self.dist += 1.0;
            -1.0
        };
        self.score += reward;
        let is_over = self.t >= self.episode_len;

        if is_over {
            self.num_games.feed(1.0);
            self.num_success
                .feed(if self.dist <= 0.0 { 1.0 } else { 0.0 });
        }

        Ok(PlayerStep {
            ob: self.ob(),
            reward,
            is_over,
            info: StepInfo {
                score: self.score,
                dist_error: self.dist,
                filename: self.filename.clone(),
                location: [self.t as f32, 0.0, 0.0],
            },
        })
    }

    fn num_games(&self) -> &StatCounter {
        &self.num_games
    }

    fn num_success(&self) -> &StatCounter {
        &self.num_success
    }

    fn reset_stat(&mut self) {
        self.num_games.reset();
        self.num_success.reset();
    }
}

/// Dummy predictor returning fixed action values.
pub struct DummyPredictor {
    q_values: Vec<f32>,
    n_calls: AtomicUsize,
}

impl DummyPredictor {
    /// Creates a predictor whose greedy action is `action`.
    pub fn greedy(num_actions: usize, action: usize) -> Self {
        let mut q_values = vec![0.0; num_actions];
        q_values[action] = 1.0;
        Self::new(q_values)
    }

    /// Creates a predictor always returning `q_values`.
    pub fn new(q_values: Vec<f32>) -> Self {
        Self {
            q_values,
            n_calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls to [`Predictor::predict`].
    pub fn n_calls(&self) -> usize {
        self.n_calls.load(Ordering::SeqCst)
    }
}

impl Predictor for DummyPredictor {
    fn predict(&self, _input: &ArrayD<u8>) -> Result<Vec<f32>> {
        self.n_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.q_values.clone())
    }
}
