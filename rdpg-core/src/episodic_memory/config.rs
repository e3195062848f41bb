//! Configuration of [`EpisodicMemory`](super::EpisodicMemory).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`EpisodicMemory`](super::EpisodicMemory).
///
/// ```rust
/// use rdpg_core::episodic_memory::EpisodicMemoryConfig;
///
/// let config = EpisodicMemoryConfig::default()
///     .capacity(1_000)
///     .max_episode_length(10)
///     .seed(7);
/// assert_eq!(config.num_trajectories(), 100);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpisodicMemoryConfig {
    /// The number of transitions the memory can hold.
    pub capacity: usize,

    /// The maximum length of a stored trajectory.
    ///
    /// A trajectory is closed when an episode ends or when it reaches this length.
    pub max_episode_length: usize,

    /// If set, sampled trajectories are cut to a random window of at most
    /// `max_sample_len + 1` time steps, giving `max_sample_len` update steps.
    #[serde(default)]
    pub max_sample_len: Option<usize>,

    /// Random seed for sampling.
    pub seed: u64,
}

impl Default for EpisodicMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 600_000,
            max_episode_length: 10,
            max_sample_len: None,
            seed: 42,
        }
    }
}

impl EpisodicMemoryConfig {
    /// Sets the number of transitions the memory can hold.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the maximum length of a stored trajectory.
    pub fn max_episode_length(mut self, v: usize) -> Self {
        self.max_episode_length = v;
        self
    }

    /// Sets the maximum number of update steps per sampled trajectory.
    pub fn max_sample_len(mut self, v: Option<usize>) -> Self {
        self.max_sample_len = v;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the number of trajectories the memory can hold.
    pub fn num_trajectories(&self) -> usize {
        self.capacity / self.max_episode_length.max(1)
    }

    /// Constructs [`EpisodicMemoryConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`EpisodicMemoryConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
