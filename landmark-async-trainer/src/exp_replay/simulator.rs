//! Collection of transitions by epsilon-greedy play.
use crate::PopulateJob;
use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use landmark_core::{
    argmax,
    replay_memory::{stack_frames, Experience, ReplayMemory},
    ExperienceBufferBase, Player, Predictor, StatCounter,
};
use log::{error, info};
use ndarray::{ArrayD, Axis};
use rand::{rngs::StdRng, Rng};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Score and distance error of episodes finished since the last trigger.
#[derive(Default)]
pub(crate) struct EpisodeStats {
    pub score: StatCounter,
    pub dist: StatCounter,
}

/// Plays the player and appends the transitions to the replay memory.
pub(crate) struct Simulator<L, P> {
    pub player: Arc<Mutex<L>>,
    pub predictor: Arc<P>,
    pub memory: Arc<Mutex<ReplayMemory>>,
    pub exploration: Arc<Mutex<f32>>,
    pub stats: Arc<Mutex<EpisodeStats>>,
    pub current_ob: ArrayD<u8>,
    pub rng: StdRng,
}

impl<L: Player, P: Predictor> Simulator<L, P> {
    /// Chooses the action on the current observation.
    ///
    /// Acts randomly with probability `exploration` and while the replay
    /// memory cannot provide a full history, greedily otherwise. Random
    /// actions come with all-zero action values.
    fn act(&mut self, num_actions: usize) -> Result<(usize, Vec<f32>)> {
        let exploration = *self.exploration.lock().unwrap();
        let history = {
            let memory = self.memory.lock().unwrap();
            if self.rng.gen::<f32>() <= exploration || memory.len() <= memory.history_len() {
                None
            } else {
                Some(memory.recent_state())
            }
        };

        match history {
            None => Ok((self.rng.gen_range(0..num_actions), vec![0.0; num_actions])),
            Some(mut frames) => {
                frames.push(self.current_ob.clone());
                let input = stack_frames(&frames)?.insert_axis(Axis(0));
                let q_values = self.predictor.predict(&input)?;
                Ok((argmax(&q_values), q_values))
            }
        }
    }

    /// Performs one environment step and appends the transition.
    ///
    /// When the episode ends, the player is reset and the observation returned
    /// by [`Player::reset`] becomes the current observation, so the first
    /// transition of the next episode starts from the reset state.
    pub fn populate(&mut self) -> Result<()> {
        let num_actions = self.player.lock().unwrap().num_actions();
        let (act, q_values) = self.act(num_actions)?;
        let old_ob = self.current_ob.clone();

        let step = {
            let mut player = self.player.lock().unwrap();
            let step = player.step(act, &q_values)?;
            if step.is_over {
                let mut stats = self.stats.lock().unwrap();
                stats.score.feed(step.info.score);
                stats.dist.feed(step.info.dist_error);
                self.current_ob = player.reset()?;
            } else {
                self.current_ob = step.ob.clone();
            }
            step
        };

        let exp = Experience::new(old_ob, act as i32, step.reward, step.is_over);
        self.memory.lock().unwrap().push(exp)
    }

    /// Runs populate jobs until stopped or the job queue is disconnected.
    ///
    /// Each job collects `update_frequency` transitions. The stop flag is
    /// checked between jobs.
    pub fn run(
        mut self,
        receiver: Receiver<PopulateJob>,
        update_frequency: usize,
        stop: Arc<Mutex<bool>>,
    ) {
        info!("Starts simulator thread");

        loop {
            if *stop.lock().unwrap() {
                break;
            }

            match receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(PopulateJob) => {
                    for _ in 0..update_frequency {
                        if let Err(e) = self.populate() {
                            error!("Simulator failed to populate the replay memory: {}", e);
                            return;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Stopped simulator thread");
    }
}
