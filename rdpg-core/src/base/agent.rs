//! Agent.
use super::{Env, Policy};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable recurrent policy on an environment.
///
/// The agent owns the recurrent state of the rollout. The
/// [`Trainer`](crate::Trainer) never touches the state directly, it only signals
/// reset events:
///
/// * [`Policy::reset`] clears the state before the first step of an episode
///   (hard reset).
/// * [`Agent::reset_hidden_state`] is called at the boundary of a trajectory
///   segment (`done == false`, soft reset) and when an episode ends
///   (`done == true`, hard reset).
///
/// Parameter updates are not part of this trait; they are performed through
/// [`RecurrentActorCritic`](crate::RecurrentActorCritic).
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Returns an action sampled uniformly from the action space.
    ///
    /// Used during the warmup period.
    fn random_action(&mut self) -> Result<E::Act>;

    /// Returns the action of the policy.
    ///
    /// * `decay_epsilon` - Decays the scale of the exploration noise after the action.
    /// * `noise_enable` - Adds exploration noise to the action.
    fn select_action(
        &mut self,
        obs: &E::Obs,
        decay_epsilon: bool,
        noise_enable: bool,
    ) -> Result<E::Act>;

    /// Clears the recurrent state of the rollout.
    ///
    /// `done == false` means that the episode continues and only the window
    /// of backpropagation is truncated.
    fn reset_hidden_state(&mut self, done: bool) -> Result<()>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// This method commonly creates a number of files in the directory, one for
    /// each network of the agent.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
