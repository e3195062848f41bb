//! Configuration of RDPG agent.
use super::{ActorConfig, CriticConfig, OuConfig};
use crate::{util::CriticLoss, Device};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Rdpg`](super::Rdpg).
///
/// `P` and `Q` are the configurations of the actor network and of the networks
/// taking observations and actions (critic and reward predictor).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RdpgConfig<P, Q> {
    /// Configuration of the actor.
    pub actor_config: ActorConfig<P>,

    /// Configuration of the critic.
    pub critic_config: CriticConfig<Q>,

    /// Configuration of the reward predictor.
    pub reward_predictor_config: CriticConfig<Q>,

    /// Exploration noise.
    pub ou_config: OuConfig,

    /// Number of noisy actions over which the noise scale decays from 1 to 0.
    pub epsilon_decay_steps: usize,

    /// Loss function of the critic.
    pub critic_loss: CriticLoss,

    /// Device for the networks.
    pub device: Option<Device>,
}

impl<P, Q> Default for RdpgConfig<P, Q> {
    fn default() -> Self {
        Self {
            actor_config: ActorConfig::default(),
            critic_config: CriticConfig::default(),
            reward_predictor_config: CriticConfig::default(),
            ou_config: OuConfig::default(),
            epsilon_decay_steps: 50_000,
            critic_loss: CriticLoss::SmoothL1,
            device: None,
        }
    }
}

impl<P, Q> RdpgConfig<P, Q> {
    /// Configuration of the actor.
    pub fn actor_config(mut self, v: ActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Configuration of the critic.
    pub fn critic_config(mut self, v: CriticConfig<Q>) -> Self {
        self.critic_config = v;
        self
    }

    /// Configuration of the reward predictor.
    pub fn reward_predictor_config(mut self, v: CriticConfig<Q>) -> Self {
        self.reward_predictor_config = v;
        self
    }

    /// Exploration noise.
    pub fn ou_config(mut self, v: OuConfig) -> Self {
        self.ou_config = v;
        self
    }

    /// Number of noisy actions over which the noise scale decays.
    pub fn epsilon_decay_steps(mut self, v: usize) -> Self {
        self.epsilon_decay_steps = v;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }
}

impl<P, Q> RdpgConfig<P, Q>
where
    P: Serialize + DeserializeOwned,
    Q: Serialize + DeserializeOwned,
{
    /// Constructs [`RdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of RDPG agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`RdpgConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of RDPG agent into {:?}", path_);
        Ok(())
    }
}
