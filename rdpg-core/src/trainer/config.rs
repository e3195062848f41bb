//! Configuration of [`Trainer`](super::Trainer).
use crate::error::RdpgError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of environment steps of a training run.
    pub max_steps: usize,

    /// Environment steps with random actions, before any update.
    pub warmup: usize,

    /// Environment steps between two soft resets of the recurrent state.
    /// An update is performed at every soft reset after the warmup.
    pub trajectory_length: usize,

    /// The maximum number of steps of the inner rollout loop.
    pub max_episode_length: usize,

    /// The number of trajectories sampled for an update.
    pub batch_size: usize,

    /// Discount factor.
    pub discount: f64,

    /// Rate of the soft update of the target networks.
    pub tau: f64,

    /// Evaluation is disabled if zero.
    pub validate_steps: usize,

    /// Completed episodes between two evaluations.
    pub eval_episode_interval: usize,

    /// The number of checkpoints saved during a training run.
    pub n_checkpoints: usize,

    /// Where to save the model parameters.
    pub model_dir: Option<String>,

    /// Treats reaching `max_episode_length` as the end of an episode.
    ///
    /// If `false`, the environment episode continues in the next rollout loop
    /// without episode bookkeeping.
    #[serde(default)]
    pub finalize_on_max_length: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_steps: 200_000,
            warmup: 100,
            trajectory_length: 5,
            max_episode_length: 500,
            batch_size: 64,
            discount: 0.99,
            tau: 0.001,
            validate_steps: 2_000,
            eval_episode_interval: 10,
            n_checkpoints: 3,
            model_dir: None,
            finalize_on_max_length: false,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of environment steps of a training run.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the warmup period in environment steps.
    pub fn warmup(mut self, v: usize) -> Self {
        self.warmup = v;
        self
    }

    /// Sets the length of trajectory segments.
    pub fn trajectory_length(mut self, v: usize) -> Self {
        self.trajectory_length = v;
        self
    }

    /// Sets the maximum number of steps of the inner rollout loop.
    pub fn max_episode_length(mut self, v: usize) -> Self {
        self.max_episode_length = v;
        self
    }

    /// Sets the number of trajectories sampled for an update.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.discount = v;
        self
    }

    /// Sets the rate of the soft update.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets `validate_steps`, zero disables evaluation.
    pub fn validate_steps(mut self, v: usize) -> Self {
        self.validate_steps = v;
        self
    }

    /// Sets the number of completed episodes between two evaluations.
    pub fn eval_episode_interval(mut self, v: usize) -> Self {
        self.eval_episode_interval = v;
        self
    }

    /// Sets the number of checkpoints saved during a training run.
    pub fn n_checkpoints(mut self, v: usize) -> Self {
        self.n_checkpoints = v;
        self
    }

    /// Sets the directory where model parameters are saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets if reaching `max_episode_length` ends an episode.
    pub fn finalize_on_max_length(mut self, v: bool) -> Self {
        self.finalize_on_max_length = v;
        self
    }

    /// Returns the interval of checkpoints in environment steps.
    pub fn checkpoint_interval(&self) -> Option<usize> {
        match self.n_checkpoints {
            0 => None,
            n => Some((self.max_steps / n).max(1)),
        }
    }

    /// Checks that a training loop can run with this configuration.
    pub fn validate(&self) -> Result<()> {
        let check = |ok: bool, msg: &str| -> Result<()> {
            match ok {
                true => Ok(()),
                false => Err(RdpgError::InvalidConfig(msg.to_string()).into()),
            }
        };
        check(self.trajectory_length > 0, "trajectory_length must be positive")?;
        check(self.max_episode_length > 0, "max_episode_length must be positive")?;
        check(self.batch_size > 0, "batch_size must be positive")?;
        check(
            self.validate_steps == 0 || self.eval_episode_interval > 0,
            "eval_episode_interval must be positive when evaluation is enabled",
        )?;
        check((0.0..=1.0).contains(&self.tau), "tau must be in [0, 1]")
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .max_steps(100)
            .warmup(10)
            .trajectory_length(4)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_checkpoint_interval() {
        let config = TrainerConfig::default().max_steps(30);
        assert_eq!(config.checkpoint_interval(), Some(10));
        assert_eq!(config.clone().max_steps(2).checkpoint_interval(), Some(1));
        assert_eq!(config.n_checkpoints(0).checkpoint_interval(), None);
    }

    #[test]
    fn test_validate() {
        assert!(TrainerConfig::default().validate().is_ok());
        assert!(TrainerConfig::default().trajectory_length(0).validate().is_err());
        assert!(TrainerConfig::default().tau(1.5).validate().is_err());
        assert!(TrainerConfig::default()
            .validate_steps(0)
            .eval_episode_interval(0)
            .validate()
            .is_ok());
    }
}
