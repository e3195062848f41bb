use super::CriticConfig;
use crate::{model::SubModel2, opt::Optimizer};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// Regression of the immediate reward from an observation and an action.
///
/// Trained alongside the critic, not used for acting.
pub struct RewardPredictor<Q: SubModel2> {
    varmap: VarMap,
    model: Q,
    opt: Optimizer,
}

impl<Q: SubModel2> RewardPredictor<Q> {
    /// Constructs [`RewardPredictor`].
    pub fn build(config: CriticConfig<Q::Config>, device: &Device) -> Result<Self> {
        let model_config = config.q_config.context("q_config is not set.")?;
        let varmap = VarMap::new();
        let model = Q::build(
            VarBuilder::from_varmap(&varmap, DType::F32, device),
            model_config,
        )?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self { varmap, model, opt })
    }

    /// Predicted rewards of shape `(batch_size, 1)`.
    pub fn forward(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        self.model.forward(obs, act)
    }

    /// Applies a gradient step.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Saves the network in `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.varmap.save(dir.join("reward_predictor.pt"))?;
        info!("Save reward predictor to {:?}", dir);
        Ok(())
    }

    /// Loads the network from `dir`.
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        self.varmap.load(dir.join("reward_predictor.pt"))?;
        info!("Load reward predictor from {:?}", dir);
        Ok(())
    }
}
