//! Evaluation of policies.
use crate::{Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::{DefaultEvaluator, DeterministicPolicy};

/// Estimates the performance of a policy on an environment.
pub trait Evaluator<E: Env> {
    /// Runs the policy on `env` and returns the mean episode return.
    ///
    /// The caller of this method needs to handle the internal state of the agent
    /// behind `policy`, like training/evaluation mode.
    fn evaluate<P: Policy<E>>(&mut self, env: &mut E, policy: &mut P) -> Result<f32>;
}
