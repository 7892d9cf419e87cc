//! Configuration of [`ReplayMemory`](super::ReplayMemory).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ReplayMemory`](super::ReplayMemory).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayMemoryConfig {
    /// Maximum number of transitions. When reached, the oldest transition
    /// is overwritten by every new one.
    pub capacity: usize,

    /// Shape of a single observation, e.g. `[45, 45, 45]`.
    pub state_shape: Vec<usize>,

    /// Number of past frames stacked into a state.
    pub history_len: usize,
}

impl Default for ReplayMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            state_shape: vec![45, 45, 45],
            history_len: 4,
        }
    }
}

impl ReplayMemoryConfig {
    /// Sets the capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the shape of an observation.
    pub fn state_shape(mut self, state_shape: Vec<usize>) -> Self {
        self.state_shape = state_shape;
        self
    }

    /// Sets the number of stacked frames.
    pub fn history_len(mut self, history_len: usize) -> Self {
        self.history_len = history_len;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
