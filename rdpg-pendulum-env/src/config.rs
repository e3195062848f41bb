use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PendulumEnv`](crate::PendulumEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PendulumConfig {
    /// Episodes end after this number of steps.
    pub max_steps: usize,

    /// If `true`, the angular velocity is a part of the observation.
    pub observe_velocity: bool,

    /// Gravity.
    pub g: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            observe_velocity: false,
            g: 10.0,
        }
    }
}

impl PendulumConfig {
    /// Sets the length of episodes.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets whether the angular velocity is observed.
    pub fn observe_velocity(mut self, v: bool) -> Self {
        self.observe_velocity = v;
        self
    }

    /// Returns the dimension of observations.
    pub fn obs_dim(&self) -> usize {
        match self.observe_velocity {
            true => 3,
            false => 2,
        }
    }

    /// Returns the dimension of actions.
    pub fn act_dim(&self) -> usize {
        1
    }

    /// Constructs [`PendulumConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PendulumConfig`].
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
    fn test_serde_pendulum_config() -> Result<()> {
        let config = PendulumConfig::default()
            .max_steps(100)
            .observe_velocity(true);
        let dir = TempDir::new("pendulum_config")?;
        let path = dir.path().join("pendulum.yaml");
        config.save(&path)?;
        assert_eq!(PendulumConfig::load(&path)?, config);
        Ok(())
    }
}
