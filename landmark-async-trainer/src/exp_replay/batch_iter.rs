use crate::{error::AsyncTrainerError, InitGate, PopulateJob};
use anyhow::Result;
use crossbeam_channel::Sender;
use landmark_core::replay_memory::{ReplayMemory, TransitionBatch};
use rand::{rngs::StdRng, Rng};
use std::sync::{Arc, Mutex};

/// Endless iterator over batches drawn uniformly from the replay memory.
///
/// Returned by [`ExpReplay::batches`](super::ExpReplay::batches). The first
/// call to `next` blocks until the initial transitions are collected. Every
/// following call first hands a [`PopulateJob`] to the simulator, blocking
/// while `populate_queue_size` jobs are pending.
pub struct BatchIter {
    pub(super) memory: Arc<Mutex<ReplayMemory>>,
    pub(super) gate: Arc<InitGate>,
    pub(super) sender: Sender<PopulateJob>,
    pub(super) rng: StdRng,
    pub(super) batch_size: usize,
    pub(super) min_index: usize,
    pub(super) job_pending: bool,
}

impl BatchIter {
    fn sample(&mut self) -> Result<TransitionBatch> {
        let memory = self.memory.lock().unwrap();
        let max_index = memory.len().saturating_sub(memory.history_len() + 1);
        if self.min_index >= max_index {
            return Err(AsyncTrainerError::InsufficientMemory {
                len: memory.len(),
                min_index: self.min_index,
            }
            .into());
        }

        let ixs = (0..self.batch_size)
            .map(|_| self.rng.gen_range(self.min_index..max_index))
            .collect::<Vec<_>>();
        memory.batch(&ixs)
    }
}

impl Iterator for BatchIter {
    type Item = Result<TransitionBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.job_pending {
            if self.sender.send(PopulateJob).is_err() {
                return Some(Err(AsyncTrainerError::SimulatorStopped.into()));
            }
            self.job_pending = false;
        }

        self.gate.wait();
        let batch = self.sample();
        self.job_pending = true;
        Some(batch)
    }
}
