//! Core functionalities.
mod agent;
mod batch;
mod env;
mod model;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use batch::{EpisodicBatch, TimeStepBatch, Transition};
pub use env::Env;
pub use model::RecurrentActorCritic;
pub use policy::{Configurable, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Environments are not vectorized, so an [`Obs`] holds a single observation.
/// [`Obs::len()`] returns the dimension of the observation vector.
pub trait Obs: Clone + Debug {
    /// Returns the dimension of the observation.
    fn len(&self) -> usize;
}

/// An action of an environment.
pub trait Act: Clone + Debug {
    /// Returns the dimension of the action.
    fn len(&self) -> usize;
}
