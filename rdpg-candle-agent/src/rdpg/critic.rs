//! Critic and its target network.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::track,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`] and [`RewardPredictor`](super::RewardPredictor).
pub struct CriticConfig<Q> {
    /// Configuration of the network.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }
}

impl<Q> CriticConfig<Q> {
    /// Sets configuration of the network.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// Action-value function with a target network.
///
/// It takes observations and actions as inputs and outputs action values of
/// shape `(batch_size, 1)`.
pub struct Critic<Q: SubModel2> {
    varmap: VarMap,
    varmap_tgt: VarMap,
    q: Q,
    q_tgt: Q,
    opt: Optimizer,
}

impl<Q> Critic<Q>
where
    Q: SubModel2,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<Q::Config>, device: &Device) -> Result<Self>
    where
        Q::Config: Clone,
    {
        let q_config = config.q_config.context("q_config is not set.")?;
        let varmap = VarMap::new();
        let q = Q::build(
            VarBuilder::from_varmap(&varmap, DType::F32, device),
            q_config.clone(),
        )?;
        let varmap_tgt = VarMap::new();
        let q_tgt = Q::build(
            VarBuilder::from_varmap(&varmap_tgt, DType::F32, device),
            q_config,
        )?;
        track(&varmap_tgt, &varmap, 1.0)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            varmap_tgt,
            q,
            q_tgt,
            opt,
        })
    }

    /// Action values of the online network.
    pub fn forward(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        self.q.forward(obs, act)
    }

    /// Action values of the target network.
    pub fn forward_tgt(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        self.q_tgt.forward(obs, act)
    }

    /// Applies a gradient step on the online network.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Moves the target network toward the online network.
    pub fn soft_update(&self, tau: f64) -> Result<()> {
        track(&self.varmap_tgt, &self.varmap, tau)
    }

    /// Variables of the online network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Variables of the target network.
    pub fn varmap_tgt(&self) -> &VarMap {
        &self.varmap_tgt
    }

    /// Saves the online and target networks in `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.varmap.save(dir.join("critic.pt"))?;
        self.varmap_tgt.save(dir.join("critic_tgt.pt"))?;
        info!("Save critic to {:?}", dir);
        Ok(())
    }

    /// Loads the online and target networks from `dir`.
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        self.varmap.load(dir.join("critic.pt"))?;
        self.varmap_tgt.load(dir.join("critic_tgt.pt"))?;
        info!("Load critic from {:?}", dir);
        Ok(())
    }
}
