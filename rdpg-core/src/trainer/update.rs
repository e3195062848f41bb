//! Update of a recurrent actor-critic agent with sampled trajectories.
use crate::{record::Aggregator, EpisodicBatch, RecurrentActorCritic, ReplayBufferBase};
use anyhow::Result;
use log::trace;

/// Performs one update with a batch of trajectories sampled from `memory`.
///
/// For each time step `t` of the batch but the last one, in order:
///
/// 1. one optimization step of the reward predictor,
/// 2. target action values from the target networks at `t + 1`,
/// 3. one optimization step of the critic,
/// 4. one optimization step of the actor.
///
/// Critic and actor losses are divided by the number of time steps of the batch.
/// The recurrent states of the online and target actors start from zero and live
/// only within this call. Target networks are soft-updated once at the end.
///
/// If the memory cannot provide `batch_size` trajectories, nothing is updated.
/// Returns the number of time steps processed.
pub fn update_policy<O, A, M, R>(
    model: &mut M,
    memory: &mut R,
    batch_size: usize,
    discount: f64,
    tau: f64,
    mut aggregator: Option<&mut Aggregator>,
) -> Result<usize>
where
    O: Clone,
    A: Clone,
    M: RecurrentActorCritic<O, A>,
    R: ReplayBufferBase<Batch = EpisodicBatch<O, A>>,
{
    let batch = memory.batch(batch_size)?;
    if batch.is_empty() {
        trace!("Skip update, not enough trajectories");
        return Ok(0);
    }

    let n = batch.batch_size();
    let scale = 1.0 / batch.len() as f64;
    let mut hidden = model.zero_hidden(n)?;
    let mut hidden_tgt = model.zero_hidden(n)?;
    let mut n_steps = 0;

    for t in 0..batch.len() - 1 {
        let ts = match batch.time_step(t) {
            Some(ts) => ts,
            None => break,
        };

        let prediction_loss = model.update_reward_predictor(&ts)?;

        let (target_q, h) = model.q_target(&ts, hidden_tgt, discount)?;
        hidden_tgt = h;

        let value_loss = model.update_critic(&ts, &target_q, scale)?;

        let (policy_loss, h) = model.update_actor(&ts, hidden, scale)?;
        hidden = h;

        trace!(
            "t = {}, prediction_loss = {}, value_loss = {}, policy_loss = {}",
            t,
            prediction_loss,
            value_loss,
            policy_loss
        );

        if let Some(agg) = aggregator.as_mut() {
            agg.add_values(&[
                ("prediction_loss", prediction_loss as f64),
                ("value_loss", value_loss as f64),
                ("policy_loss", policy_loss as f64),
            ]);
        }
        n_steps += 1;
    }

    model.soft_update(tau)?;

    Ok(n_steps)
}
