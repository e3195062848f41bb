//! Toy environment and agent used in tests.
//!
//! [`DummyEnv`] is a counter: the observation is the number of steps since the
//! last reset, actions are ignored and the reward is the negative observation.
//! [`DummyAgent`] counts every call the training loop makes, so tests can check
//! the schedule of actions, resets and updates without neural networks.
use crate::{
    record::Record, Act, Agent, Env, Obs, Policy, RecurrentActorCritic, Step, TimeStepBatch,
};
use anyhow::{bail, Result};
use std::path::Path;

/// Observation of [`DummyEnv`].
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub f32);

impl Obs for DummyObs {
    fn len(&self) -> usize {
        1
    }
}

impl AsRef<[f32]> for DummyObs {
    fn as_ref(&self) -> &[f32] {
        std::slice::from_ref(&self.0)
    }
}

/// Action of [`DummyEnv`].
#[derive(Clone, Debug, PartialEq)]
pub struct DummyAct(pub f32);

impl Act for DummyAct {
    fn len(&self) -> usize {
        1
    }
}

impl AsRef<[f32]> for DummyAct {
    fn as_ref(&self) -> &[f32] {
        std::slice::from_ref(&self.0)
    }
}

impl From<Vec<f32>> for DummyAct {
    fn from(v: Vec<f32>) -> Self {
        Self(v.first().copied().unwrap_or_default())
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug, Default)]
pub struct DummyEnvConfig {
    /// Episodes end after this number of steps. Never ends if `None`.
    pub episode_len: Option<usize>,
}

/// A counter environment.
pub struct DummyEnv {
    episode_len: Option<usize>,
    state: usize,

    /// The number of calls of [`Env::reset`].
    pub n_resets: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            episode_len: config.episode_len,
            state: 0,
            n_resets: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.state += 1;
        let obs = DummyObs(self.state as f32);
        let reward = -(self.state as f32).abs();
        let is_done = self.episode_len.map_or(false, |n| self.state >= n);
        Ok((Step::new(obs, a.clone(), reward, is_done, ()), Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.state = 0;
        self.n_resets += 1;
        Ok(DummyObs(0.0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

/// An agent counting the calls of the training loop.
///
/// Random actions are `-1`, policy actions are `1`. The recurrent state of the
/// update is the number of time steps it has been advanced.
#[derive(Default, Debug)]
pub struct DummyAgent {
    /// Training mode.
    pub train: bool,
    /// Calls of [`Agent::random_action`].
    pub n_random_actions: usize,
    /// Calls of [`Agent::select_action`].
    pub n_policy_actions: usize,
    /// Calls of [`Agent::select_action`] with the noise disabled.
    pub n_deterministic_actions: usize,
    /// Calls of [`Policy::reset`].
    pub n_hard_resets: usize,
    /// Calls of [`Agent::reset_hidden_state`] with `done == false`.
    pub n_soft_resets: usize,
    /// Calls of [`Agent::reset_hidden_state`] with `done == true`.
    pub n_done_resets: usize,
    /// Calls of [`Agent::save_params`].
    pub n_saves: std::cell::Cell<usize>,
    /// If `true`, [`Agent::save_params`] fails.
    pub fail_save: bool,
    /// Optimization steps of the reward predictor.
    pub n_predictor_steps: usize,
    /// Optimization steps of the critic.
    pub n_critic_steps: usize,
    /// Optimization steps of the actor.
    pub n_actor_steps: usize,
    /// Soft updates of the target networks.
    pub n_soft_updates: usize,
    /// Recurrent states received by `update_actor`.
    pub actor_hidden: Vec<usize>,
    /// Recurrent states received by `q_target`.
    pub target_hidden: std::cell::RefCell<Vec<usize>>,
    /// Loss scales received by `update_critic`.
    pub scales: Vec<f64>,
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, obs: &DummyObs) -> Result<DummyAct> {
        self.select_action(obs, false, false)
    }

    fn reset(&mut self) -> Result<()> {
        self.n_hard_resets += 1;
        Ok(())
    }
}

impl Agent<DummyEnv> for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn random_action(&mut self) -> Result<DummyAct> {
        self.n_random_actions += 1;
        Ok(DummyAct(-1.0))
    }

    fn select_action(
        &mut self,
        _obs: &DummyObs,
        _decay_epsilon: bool,
        noise_enable: bool,
    ) -> Result<DummyAct> {
        match noise_enable {
            true => self.n_policy_actions += 1,
            false => self.n_deterministic_actions += 1,
        }
        Ok(DummyAct(1.0))
    }

    fn reset_hidden_state(&mut self, done: bool) -> Result<()> {
        match done {
            true => self.n_done_resets += 1,
            false => self.n_soft_resets += 1,
        }
        Ok(())
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        self.n_saves.set(self.n_saves.get() + 1);
        if self.fail_save {
            bail!("Failed to save parameters");
        }
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

impl RecurrentActorCritic<DummyObs, DummyAct> for DummyAgent {
    type Hidden = usize;
    type Target = Vec<f32>;

    fn zero_hidden(&self, _batch_size: usize) -> Result<usize> {
        Ok(0)
    }

    fn update_reward_predictor(&mut self, _batch: &TimeStepBatch<DummyObs, DummyAct>) -> Result<f32> {
        self.n_predictor_steps += 1;
        Ok(1.0)
    }

    fn q_target(
        &self,
        batch: &TimeStepBatch<DummyObs, DummyAct>,
        hidden: usize,
        discount: f64,
    ) -> Result<(Vec<f32>, usize)> {
        self.target_hidden.borrow_mut().push(hidden);
        let target = batch
            .reward
            .iter()
            .zip(batch.next_obs.iter())
            .map(|(r, o)| r + discount as f32 * o.0)
            .collect();
        Ok((target, hidden + 1))
    }

    fn update_critic(
        &mut self,
        _batch: &TimeStepBatch<DummyObs, DummyAct>,
        _target: &Vec<f32>,
        scale: f64,
    ) -> Result<f32> {
        self.n_critic_steps += 1;
        self.scales.push(scale);
        Ok(2.0 * scale as f32)
    }

    fn update_actor(
        &mut self,
        _batch: &TimeStepBatch<DummyObs, DummyAct>,
        hidden: usize,
        scale: f64,
    ) -> Result<(f32, usize)> {
        self.n_actor_steps += 1;
        self.actor_hidden.push(hidden);
        Ok((-3.0 * scale as f32, hidden + 1))
    }

    fn soft_update(&mut self, _tau: f64) -> Result<()> {
        self.n_soft_updates += 1;
        Ok(())
    }
}
