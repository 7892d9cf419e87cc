//! Configuration of [`ExpReplay`](super::ExpReplay).
use anyhow::Result;
use landmark_core::replay_memory::ReplayMemoryConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ExpReplay`](super::ExpReplay).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExpReplayConfig {
    /// Number of samples in a batch.
    pub batch_size: usize,

    /// Capacity of the replay memory.
    pub memory_size: usize,

    /// Number of transitions collected before training starts.
    pub init_memory_size: usize,

    /// Probability of a random action at the beginning of training.
    pub init_exploration: f32,

    /// Number of transitions collected per consumed batch.
    pub update_frequency: usize,

    /// Number of stacked frames in a state.
    pub history_len: usize,

    /// Shape of a single observation.
    pub state_shape: Vec<usize>,

    /// Maximum number of populate jobs waiting for the simulator.
    pub populate_queue_size: usize,

    /// Seed of the random number generators.
    pub seed: u64,
}

impl Default for ExpReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 48,
            memory_size: 100_000,
            init_memory_size: 50_000,
            init_exploration: 1.0,
            update_frequency: 4,
            history_len: 4,
            state_shape: vec![45, 45, 45],
            populate_queue_size: 5,
            seed: 42,
        }
    }
}

impl ExpReplayConfig {
    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the capacity of the replay memory.
    pub fn memory_size(mut self, v: usize) -> Self {
        self.memory_size = v;
        self
    }

    /// Sets the number of transitions collected before training.
    pub fn init_memory_size(mut self, v: usize) -> Self {
        self.init_memory_size = v;
        self
    }

    /// Sets the initial exploration rate.
    pub fn init_exploration(mut self, v: f32) -> Self {
        self.init_exploration = v;
        self
    }

    /// Sets the number of transitions collected per batch.
    pub fn update_frequency(mut self, v: usize) -> Self {
        self.update_frequency = v;
        self
    }

    /// Sets the number of stacked frames.
    pub fn history_len(mut self, v: usize) -> Self {
        self.history_len = v;
        self
    }

    /// Sets the shape of an observation.
    pub fn state_shape(mut self, v: Vec<usize>) -> Self {
        self.state_shape = v;
        self
    }

    /// Sets the capacity of the populate job queue.
    pub fn populate_queue_size(mut self, v: usize) -> Self {
        self.populate_queue_size = v;
        self
    }

    /// Sets the seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Configuration of the underlying replay memory.
    pub fn replay_memory_config(&self) -> ReplayMemoryConfig {
        ReplayMemoryConfig::default()
            .capacity(self.memory_size)
            .state_shape(self.state_shape.clone())
            .history_len(self.history_len)
    }

    /// Smallest logical index batches are drawn from.
    ///
    /// The oldest transitions are skipped since the simulator may overwrite
    /// them while a batch is assembled.
    pub fn min_sample_index(&self) -> usize {
        self.populate_queue_size * self.update_frequency
    }

    /// Constructs [`ExpReplayConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ExpReplayConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
