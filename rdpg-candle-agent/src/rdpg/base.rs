use super::{Actor, Critic, OrnsteinUhlenbeck, RdpgConfig, RewardPredictor};
use crate::{
    model::{RecurrentSubModel, SubModel2},
    util::{smooth_l1_loss, CriticLoss, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::{loss::mse, rnn::LSTMState};
use rdpg_core::{Agent, Configurable, Env, Policy, RecurrentActorCritic, TimeStepBatch};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryInto, fs, marker::PhantomData, path::Path};

/// Stacks values into a tensor of shape `(n, dim)`.
fn to_tensor<T: AsRef<[f32]>>(xs: &[T], device: &Device) -> Result<Tensor> {
    let dim = xs.first().map_or(0, |x| x.as_ref().len());
    let data = xs
        .iter()
        .flat_map(|x| x.as_ref().iter().copied())
        .collect::<Vec<_>>();
    Ok(Tensor::from_vec(data, (xs.len(), dim), device)?)
}

fn detach(state: &LSTMState) -> LSTMState {
    LSTMState::new(state.h().detach(), state.c().detach())
}

/// Recurrent deterministic policy gradient (RDPG) agent.
///
/// Observations and actions cross the boundary as `f32` slices. Actions are in
/// `[-1, 1]`; scaling to the range of the environment is up to the environment.
///
/// The rollout keeps its own recurrent state of batch size 1, separate from the
/// recurrent states of [`update_policy`](rdpg_core::trainer::update_policy).
pub struct Rdpg<E, P, Q>
where
    E: Env,
    P: RecurrentSubModel,
    Q: SubModel2,
{
    actor: Actor<P>,
    critic: Critic<Q>,
    reward_predictor: RewardPredictor<Q>,
    ou: OrnsteinUhlenbeck,
    critic_loss: CriticLoss,
    epsilon: f64,
    depsilon: f64,
    act_dim: usize,
    state: Option<LSTMState>,
    train: bool,
    device: Device,
    phantom: PhantomData<E>,
}

impl<E, P, Q> Rdpg<E, P, Q>
where
    E: Env,
    P: RecurrentSubModel,
    Q: SubModel2,
{
    /// Returns the actor.
    pub fn actor(&self) -> &Actor<P> {
        &self.actor
    }

    /// Returns the critic.
    pub fn critic(&self) -> &Critic<Q> {
        &self.critic
    }

    /// Returns the current scale of the exploration noise.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl<E, P, Q> Configurable<E> for Rdpg<E, P, Q>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: AsRef<[f32]> + From<Vec<f32>>,
    P: RecurrentSubModel,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q: SubModel2,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    type Config = RdpgConfig<P::Config, Q::Config>;

    /// Constructs [`Rdpg`] agent.
    fn build(config: Self::Config) -> Result<Self> {
        let device: Device = config.device.unwrap_or_default().try_into()?;
        let act_dim = config
            .actor_config
            .get_out_dim()
            .context("pi_config is not set.")?;
        let actor = Actor::build(config.actor_config, &device)?;
        let critic = Critic::build(config.critic_config, &device)?;
        let reward_predictor = RewardPredictor::build(config.reward_predictor_config, &device)?;
        let depsilon = match config.epsilon_decay_steps {
            0 => 0.0,
            n => 1.0 / n as f64,
        };

        Ok(Self {
            actor,
            critic,
            reward_predictor,
            ou: OrnsteinUhlenbeck::new(config.ou_config),
            critic_loss: config.critic_loss,
            epsilon: 1.0,
            depsilon,
            act_dim,
            state: None,
            train: true,
            device,
            phantom: PhantomData,
        })
    }
}

impl<E, P, Q> Policy<E> for Rdpg<E, P, Q>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: AsRef<[f32]> + From<Vec<f32>>,
    P: RecurrentSubModel,
    Q: SubModel2,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        self.select_action(obs, false, true)
    }

    fn reset(&mut self) -> Result<()> {
        self.state = None;
        self.ou.reset();
        Ok(())
    }
}

impl<E, P, Q> Agent<E> for Rdpg<E, P, Q>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: AsRef<[f32]> + From<Vec<f32>>,
    P: RecurrentSubModel,
    Q: SubModel2,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn random_action(&mut self) -> Result<E::Act> {
        let act = Tensor::rand(-1f32, 1f32, (self.act_dim,), &self.device)?;
        Ok(act.to_vec1::<f32>()?.into())
    }

    fn select_action(
        &mut self,
        obs: &E::Obs,
        decay_epsilon: bool,
        noise_enable: bool,
    ) -> Result<E::Act> {
        let obs = to_tensor(std::slice::from_ref(obs), &self.device)?;
        let state = match self.state.take() {
            Some(state) => state,
            None => self.actor.zero_state(1)?,
        };
        let (act, state) = self.actor.step(&obs, &state)?;
        self.state = Some(detach(&state));

        let act = match noise_enable && self.train {
            true => {
                let noise = self.ou.sample(act.dims(), &self.device)?;
                (act.detach() + (noise * self.epsilon.max(0.0))?)?
            }
            false => act.detach(),
        };
        let act = act.clamp(-1f32, 1f32)?;

        if decay_epsilon {
            self.epsilon -= self.depsilon;
        }

        Ok(act.flatten_all()?.to_vec1::<f32>()?.into())
    }

    fn reset_hidden_state(&mut self, done: bool) -> Result<()> {
        self.state = None;
        if done {
            self.ou.reset();
        }
        Ok(())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(path)?;
        self.critic.save(path)?;
        self.reward_predictor.save(path)?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path)?;
        self.critic.load(path)?;
        self.reward_predictor.load(path)?;
        self.state = None;
        Ok(())
    }
}

impl<E, P, Q> RecurrentActorCritic<E::Obs, E::Act> for Rdpg<E, P, Q>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: AsRef<[f32]>,
    P: RecurrentSubModel,
    Q: SubModel2,
{
    type Hidden = LSTMState;
    type Target = Tensor;

    fn zero_hidden(&self, batch_size: usize) -> Result<LSTMState> {
        self.actor.zero_state(batch_size)
    }

    fn update_reward_predictor(&mut self, batch: &TimeStepBatch<E::Obs, E::Act>) -> Result<f32> {
        let obs = to_tensor(&batch.obs, &self.device)?;
        let act = to_tensor(&batch.act, &self.device)?;
        let reward = Tensor::from_slice(&batch.reward, (batch.len(), 1), &self.device)?;

        let pred = self.reward_predictor.forward(&obs, &act)?;
        let loss = mse(&pred, &reward)?;
        self.reward_predictor.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn q_target(
        &self,
        batch: &TimeStepBatch<E::Obs, E::Act>,
        hidden: LSTMState,
        discount: f64,
    ) -> Result<(Tensor, LSTMState)> {
        let next_obs = to_tensor(&batch.next_obs, &self.device)?;
        let reward = Tensor::from_slice(&batch.reward, (batch.len(), 1), &self.device)?;

        let (next_act, hidden) = self.actor.step_tgt(&next_obs, &hidden)?;
        let next_q = self.critic.forward_tgt(&next_obs, &next_act)?;
        let target = (reward + (next_q * discount)?)?.detach();

        Ok((target, detach(&hidden)))
    }

    fn update_critic(
        &mut self,
        batch: &TimeStepBatch<E::Obs, E::Act>,
        target: &Tensor,
        scale: f64,
    ) -> Result<f32> {
        let obs = to_tensor(&batch.obs, &self.device)?;
        let act = to_tensor(&batch.act, &self.device)?;

        let q = self.critic.forward(&obs, &act)?;
        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&q, target)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&q, target)?,
        };
        let loss = (loss * scale)?;
        self.critic.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn update_actor(
        &mut self,
        batch: &TimeStepBatch<E::Obs, E::Act>,
        hidden: LSTMState,
        scale: f64,
    ) -> Result<(f32, LSTMState)> {
        let obs = to_tensor(&batch.obs, &self.device)?;

        let (act, hidden) = self.actor.step(&obs, &hidden)?;
        let q = self.critic.forward(&obs, &act)?;
        let loss = (q.mean_all()? * -scale)?;
        self.actor.backward_step(&loss)?;

        Ok((loss.to_scalar::<f32>()?, detach(&hidden)))
    }

    fn soft_update(&mut self, tau: f64) -> Result<()> {
        self.actor.soft_update(tau)?;
        self.critic.soft_update(tau)
    }
}
