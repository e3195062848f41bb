//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{Agent, Env, Policy};
use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use std::path::Path;

/// Runs a fixed number of episodes and returns the average return.
///
/// The per-episode returns of every call of [`Evaluator::evaluate`] are kept, and
/// can be written as CSV with [`DefaultEvaluator::save_results`].
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::new(10, 2_000, Some(200));
/// let mean_return = evaluator.evaluate(&mut env, &mut DeterministicPolicy::new(&mut agent))?;
/// ```
pub struct DefaultEvaluator {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Environment steps between two evaluations, used to label saved results.
    interval: usize,

    /// Episodes are cut after this number of steps.
    max_episode_length: Option<usize>,

    /// Returns of the episodes of each evaluation.
    results: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct EvaluationRow {
    step: usize,
    mean: f32,
    std: f32,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator {
    fn evaluate<P: Policy<E>>(&mut self, env: &mut E, policy: &mut P) -> Result<f32> {
        let mut returns = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = env.reset_with_index(ix)?;
            policy.reset()?;
            let mut r_total = 0f32;
            let mut steps = 0;

            loop {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = env.step(&act)?;
                r_total += step.reward;
                steps += 1;
                if step.is_done() || self.max_episode_length.map_or(false, |m| steps >= m) {
                    break;
                }
                prev_obs = step.obs;
            }

            debug!("Evaluation episode {}: return {}", ix, r_total);
            returns.push(r_total);
        }

        let mean = returns.iter().sum::<f32>() / self.n_episodes.max(1) as f32;
        self.results.push(returns);
        Ok(mean)
    }
}

impl DefaultEvaluator {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `n_episodes` - Number of episodes to run during evaluation.
    /// * `interval` - Environment steps between two evaluations.
    /// * `max_episode_length` - Episodes are cut after this number of steps.
    pub fn new(n_episodes: usize, interval: usize, max_episode_length: Option<usize>) -> Self {
        Self {
            n_episodes,
            interval,
            max_episode_length,
            results: vec![],
        }
    }

    /// Returns the per-episode returns of each evaluation.
    pub fn results(&self) -> &[Vec<f32>] {
        &self.results
    }

    /// Writes the mean and standard deviation of each evaluation as CSV.
    pub fn save_results(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(&path)?;
        for (i, returns) in self.results.iter().enumerate() {
            let n = returns.len().max(1) as f32;
            let mean = returns.iter().sum::<f32>() / n;
            let std = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / n).sqrt();
            wtr.serialize(EvaluationRow {
                step: i * self.interval,
                mean,
                std,
            })?;
        }
        wtr.flush()?;
        info!("Saved evaluation results in {:?}", path.as_ref());
        Ok(())
    }
}

/// A view of an [`Agent`] taking actions without exploration noise.
///
/// Sampling neither adds noise nor decays the scale of the noise.
pub struct DeterministicPolicy<'a, A> {
    agent: &'a mut A,
}

impl<'a, A> DeterministicPolicy<'a, A> {
    /// Wraps an agent.
    pub fn new(agent: &'a mut A) -> Self {
        Self { agent }
    }
}

impl<'a, E, A> Policy<E> for DeterministicPolicy<'a, A>
where
    E: Env,
    A: Agent<E>,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        self.agent.select_action(obs, false, false)
    }

    fn reset(&mut self) -> Result<()> {
        Policy::<E>::reset(&mut *self.agent)
    }
}
