//! Recurrent actor and its target network.
use crate::{
    model::RecurrentSubModel,
    opt::{Optimizer, OptimizerConfig},
    util::{track, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{rnn::LSTMState, VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P> {
    /// Configuration of the policy network.
    pub pi_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl<P> ActorConfig<P> {
    /// Sets configuration of the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

impl<P: OutDim> ActorConfig<P> {
    /// Sets the dimension of actions.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.pi_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Returns the dimension of actions.
    pub fn get_out_dim(&self) -> Option<usize> {
        self.pi_config.as_ref().map(|c| c.get_out_dim())
    }
}

/// Recurrent deterministic policy with a target network.
///
/// The target network starts as a copy of the online network.
pub struct Actor<P: RecurrentSubModel> {
    varmap: VarMap,
    varmap_tgt: VarMap,
    pi: P,
    pi_tgt: P,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: RecurrentSubModel,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: &Device) -> Result<Self>
    where
        P::Config: Clone,
    {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let varmap = VarMap::new();
        let pi = P::build(
            VarBuilder::from_varmap(&varmap, DType::F32, device),
            pi_config.clone(),
        )?;
        let varmap_tgt = VarMap::new();
        let pi_tgt = P::build(
            VarBuilder::from_varmap(&varmap_tgt, DType::F32, device),
            pi_config,
        )?;
        track(&varmap_tgt, &varmap, 1.0)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            varmap_tgt,
            pi,
            pi_tgt,
            opt,
        })
    }

    /// Returns the zero recurrent state for a batch.
    pub fn zero_state(&self, batch_size: usize) -> Result<LSTMState> {
        self.pi.zero_state(batch_size)
    }

    /// Actions of the online network and the next recurrent state.
    pub fn step(&self, obs: &Tensor, state: &LSTMState) -> Result<(Tensor, LSTMState)> {
        self.pi.step(obs, state)
    }

    /// Actions of the target network and the next recurrent state.
    pub fn step_tgt(&self, obs: &Tensor, state: &LSTMState) -> Result<(Tensor, LSTMState)> {
        self.pi_tgt.step(obs, state)
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
        self.varmap.save(dir.join("actor.pt"))?;
        self.varmap_tgt.save(dir.join("actor_tgt.pt"))?;
        info!("Save actor to {:?}", dir);
        Ok(())
    }

    /// Loads the online and target networks from `dir`.
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        self.varmap.load(dir.join("actor.pt"))?;
        self.varmap_tgt.load(dir.join("actor_tgt.pt"))?;
        info!("Load actor from {:?}", dir);
        Ok(())
    }
}
