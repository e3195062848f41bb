//! Train [`Agent`].
mod config;
mod update;
use crate::{
    record::{Aggregator, Record, RecordValue, Recorder},
    Agent, DeterministicPolicy, Env, EpisodicBatch, Evaluator, ExperienceBufferBase,
    RecurrentActorCritic, ReplayBufferBase, Transition,
};
use anyhow::Result;
use chrono::Local;
use log::{info, trace, warn};
use std::path::Path;
pub use config::TrainerConfig;
pub use update::update_policy;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop of a recurrent actor-critic agent.
///
/// # Training loop
///
/// [`Trainer::train()`] runs until `max_steps` environment steps have been taken.
/// The outer loop runs rollouts of at most `max_episode_length` steps:
///
/// 1. If there is no current observation `state0`, reset [`Env`] and hard-reset the
///    recurrent state of the agent with [`Policy::reset`](crate::Policy::reset).
/// 2. Take a random action while `env_steps < warmup`, otherwise take the action of
///    the agent with exploration noise.
/// 3. Step the environment and push `(state0, act, reward, is_done)` to the memory.
///    `env_steps += 1`, `trajectory_steps += 1`, `state0 = next obs`.
/// 4. If `trajectory_steps == trajectory_length`:
///     * soft-reset the recurrent state (`reset_hidden_state(false)`),
///     * `trajectory_steps = 0`,
///     * if `env_steps > warmup`, update the agent with [`update_policy`].
/// 5. Every `max_steps / n_checkpoints` environment steps, save the model
///    parameters in `model_dir`. A failure is logged and ignored.
/// 6. If the episode ends, add its return to the aggregator as `"reward"`,
///    hard-reset the recurrent state (`reset_hidden_state(true)`),
///    `episodes += 1`, clear `state0` and leave the rollout.
/// 7. After every `eval_episode_interval` completed episodes, if evaluation is
///    enabled and the warmup is over, evaluate the agent without exploration noise,
///    write the aggregated metrics to the [`Recorder`] and reset the aggregator.
///
/// A rollout stopped by `max_episode_length` keeps `state0`, so the next rollout
/// continues the same episode of the environment, unless
/// [`TrainerConfig::finalize_on_max_length`] is set.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|Transition|C[EpisodicMemory]
///     C -->|EpisodicBatch|D[update_policy]
///     D -->|RecurrentActorCritic|A
/// ```
///
/// # Records
///
/// Each evaluation writes a [`Record`] with the following keys:
///
/// * `env_steps`
/// * `train/reward` - mean return of the training episodes since the last evaluation
/// * `val/reward` - mean return of the evaluation
/// * `train/prediction_loss`, `train/value_loss`, `train/policy_loss` - mean losses
/// * `train/update_steps_per_sec`
pub struct Trainer {
    config: TrainerConfig,

    /// Environment steps.
    env_steps: usize,

    /// Completed episodes.
    episodes: usize,

    /// Environment steps since the last soft reset.
    trajectory_steps: usize,

    /// Calls of the update algorithm.
    n_updates: usize,

    aggregator: Aggregator,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            config,
            env_steps: 0,
            episodes: 0,
            trajectory_steps: 0,
            n_updates: 0,
            aggregator: Aggregator::default(),
        }
    }

    /// Returns the number of environment steps taken so far.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Returns the number of completed episodes.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Returns the number of environment steps since the last soft reset.
    pub fn trajectory_steps(&self) -> usize {
        self.trajectory_steps
    }

    /// Returns the number of calls of the update algorithm.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Returns the aggregator of the current reporting window.
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    fn save_model<E: Env, A: Agent<E>>(agent: &A, model_dir: &str) {
        match agent.save_params(Path::new(model_dir)) {
            Ok(()) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    fn update<O, A, M, R>(&mut self, model: &mut M, memory: &mut R) -> Result<()>
    where
        O: Clone,
        A: Clone,
        M: RecurrentActorCritic<O, A>,
        R: ReplayBufferBase<Batch = EpisodicBatch<O, A>>,
    {
        let n_steps = update_policy(
            model,
            memory,
            self.config.batch_size,
            self.config.discount,
            self.config.tau,
            Some(&mut self.aggregator),
        )?;
        self.n_updates += 1;
        trace!("Update {}: {} time steps", self.n_updates, n_steps);
        Ok(())
    }

    fn evaluate<E, A, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E>,
        D: Evaluator<E>,
    {
        agent.eval();
        let val_reward = evaluator.evaluate(env, &mut DeterministicPolicy::new(&mut *agent));
        agent.train();
        let val_reward = val_reward?;

        let agg = &self.aggregator;
        let speed = agg.speed(Some("prediction_loss"));
        info!(
            "[Evaluate] env_steps = {:07}: mean_reward = {}, speed = {:.2} update steps/s",
            self.env_steps, val_reward, speed
        );

        let mut record = Record::from_scalar("env_steps", self.env_steps as f32);
        let scalars = [
            ("train/reward", agg.mean("reward")),
            ("val/reward", val_reward as f64),
            ("train/prediction_loss", agg.mean("prediction_loss")),
            ("train/value_loss", agg.mean("value_loss")),
            ("train/policy_loss", agg.mean("policy_loss")),
            ("train/update_steps_per_sec", speed),
        ];
        for (k, v) in scalars.iter() {
            record.insert(*k, RecordValue::Scalar(*v as f32));
        }
        record.insert("datetime", RecordValue::DateTime(Local::now()));
        recorder.write(record);

        self.aggregator.reset();
        Ok(())
    }

    /// Train the agent.
    ///
    /// `env` is used both for training and evaluation. Errors of the environment,
    /// the agent, the memory or the evaluator end the training run.
    pub fn train<E, A, R, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        memory: &mut R,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E> + RecurrentActorCritic<E::Obs, E::Act>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>
            + ReplayBufferBase<Batch = EpisodicBatch<E::Obs, E::Act>>,
        D: Evaluator<E>,
    {
        self.config.validate()?;
        let max_steps = self.config.max_steps;
        let max_episode_length = self.config.max_episode_length;
        let checkpoint_interval = self.config.checkpoint_interval();
        let model_dir = self.config.model_dir.clone();
        let mut state0: Option<E::Obs> = None;
        let mut episode_reward = 0f32;
        agent.train();

        while self.env_steps < max_steps {
            let mut episode_steps = 0;
            let mut episode_done = false;

            while episode_steps < max_episode_length && self.env_steps < max_steps {
                // Start of an episode
                let obs = match state0.take() {
                    Some(obs) => obs,
                    None => {
                        let obs = env.reset()?;
                        agent.reset()?;
                        episode_reward = 0.0;
                        obs
                    }
                };

                let act = match self.env_steps < self.config.warmup {
                    true => agent.random_action()?,
                    false => agent.select_action(&obs, true, true)?,
                };
                let (step, _) = env.step(&act)?;
                let is_done = step.is_done()
                    || (self.config.finalize_on_max_length
                        && episode_steps + 1 >= max_episode_length);
                memory.push(Transition::new(obs, act, step.reward, is_done))?;

                self.env_steps += 1;
                episode_steps += 1;
                self.trajectory_steps += 1;
                episode_reward += step.reward;
                state0 = Some(step.obs);

                // End of a trajectory segment
                if self.trajectory_steps >= self.config.trajectory_length {
                    agent.reset_hidden_state(false)?;
                    self.trajectory_steps = 0;
                    if self.env_steps > self.config.warmup {
                        self.update(agent, memory)?;
                    }
                }

                if let (Some(interval), Some(model_dir)) = (checkpoint_interval, &model_dir) {
                    if self.env_steps % interval == 0 {
                        Self::save_model(agent, model_dir);
                    }
                }

                if is_done {
                    self.aggregator.add("reward", episode_reward as f64, 1);
                    info!(
                        "#{}: episode_reward = {}, env_steps = {}",
                        self.episodes, episode_reward, self.env_steps
                    );
                    state0 = None;
                    episode_reward = 0.0;
                    self.episodes += 1;
                    agent.reset_hidden_state(true)?;
                    episode_done = true;
                    break;
                }
            }

            if episode_done
                && self.config.validate_steps > 0
                && self.episodes % self.config.eval_episode_interval == 0
                && self.env_steps > self.config.warmup
            {
                self.evaluate(env, agent, recorder, evaluator)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
