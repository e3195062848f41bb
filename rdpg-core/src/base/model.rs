//! Update interface of recurrent actor-critic agents.
use super::TimeStepBatch;
use anyhow::Result;

/// Per-time-step operations of the recurrent actor-critic update.
///
/// [`update_policy`](crate::trainer::update_policy) drives these methods over a
/// sampled [`EpisodicBatch`](crate::EpisodicBatch). The recurrent states of the
/// online actor and the target actor are values of type [`Self::Hidden`] owned by
/// the caller. They are created by [`Self::zero_hidden`], passed into the methods
/// and returned advanced by one time step, so they never outlive one update call.
///
/// [`Self::Hidden`]: RecurrentActorCritic::Hidden
/// [`Self::zero_hidden`]: RecurrentActorCritic::zero_hidden
pub trait RecurrentActorCritic<O, A> {
    /// Recurrent state of an actor for a batch of trajectories.
    type Hidden;

    /// Target action values, detached from any computation graph.
    type Target;

    /// Returns the initial recurrent state for `batch_size` trajectories.
    fn zero_hidden(&self, batch_size: usize) -> Result<Self::Hidden>;

    /// Takes one optimization step of the reward predictor on `(o_t, a_t) -> r_t`.
    ///
    /// Returns the mean squared error.
    fn update_reward_predictor(&mut self, batch: &TimeStepBatch<O, A>) -> Result<f32>;

    /// Computes `r_t + discount * Q'(o_t+1, mu'(o_t+1))` with the target networks.
    ///
    /// `hidden` is the recurrent state of the target actor, returned advanced by one step.
    fn q_target(
        &self,
        batch: &TimeStepBatch<O, A>,
        hidden: Self::Hidden,
        discount: f64,
    ) -> Result<(Self::Target, Self::Hidden)>;

    /// Takes one optimization step of the critic.
    ///
    /// The Huber loss between `Q(o_t, a_t)` and `target` is multiplied by `scale`.
    /// Returns the scaled loss.
    fn update_critic(
        &mut self,
        batch: &TimeStepBatch<O, A>,
        target: &Self::Target,
        scale: f64,
    ) -> Result<f32>;

    /// Takes one optimization step of the actor.
    ///
    /// The loss is `-scale * mean(Q(o_t, mu(o_t)))`. `hidden` is the recurrent state of
    /// the online actor; the returned state is detached from the computation graph.
    /// Returns the scaled loss and the advanced state.
    fn update_actor(
        &mut self,
        batch: &TimeStepBatch<O, A>,
        hidden: Self::Hidden,
        scale: f64,
    ) -> Result<(f32, Self::Hidden)>;

    /// Moves the target networks toward the online networks,
    /// `target = tau * online + (1 - tau) * target`.
    fn soft_update(&mut self, tau: f64) -> Result<()>;
}
