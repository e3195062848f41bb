use super::EpisodicMemoryConfig;
use crate::{
    error::RdpgError, EpisodicBatch, ExperienceBufferBase, ReplayBufferBase, Transition,
};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::VecDeque, mem};

/// A replay memory of trajectories.
///
/// Transitions pushed with [`ExperienceBufferBase::push`] are appended to the
/// trajectory in progress. The trajectory is stored when the transition ends the
/// episode or when the trajectory reaches `max_episode_length`. At most
/// `capacity / max_episode_length` trajectories are kept and the oldest is
/// dropped first.
///
/// [`ReplayBufferBase::batch`] samples trajectories uniformly with replacement
/// among those at least as long as the sampled window, which is the longest
/// stored trajectory, cut to `max_sample_len + 1` transitions if set. Every time
/// step of the returned [`EpisodicBatch`] has the same batch size. An empty batch
/// is returned while fewer trajectories than the batch size are stored.
pub struct EpisodicMemory<O, A> {
    num_trajectories: usize,
    max_episode_length: usize,
    max_sample_len: Option<usize>,
    trajectories: VecDeque<Vec<Transition<O, A>>>,
    current: Vec<Transition<O, A>>,
    rng: StdRng,
}

impl<O, A> EpisodicMemory<O, A> {
    /// Returns the number of transitions in the trajectory in progress.
    pub fn current_len(&self) -> usize {
        self.current.len()
    }

    /// Returns the number of trajectories the memory can hold.
    pub fn num_trajectories(&self) -> usize {
        self.num_trajectories
    }

    /// Returns the stored trajectories, oldest first.
    pub fn trajectories(&self) -> impl Iterator<Item = &[Transition<O, A>]> {
        self.trajectories.iter().map(|t| t.as_slice())
    }

    fn close_trajectory(&mut self) {
        let trajectory = mem::take(&mut self.current);
        if self.trajectories.len() == self.num_trajectories {
            self.trajectories.pop_front();
        }
        self.trajectories.push_back(trajectory);
    }
}

impl<O, A> ExperienceBufferBase for EpisodicMemory<O, A> {
    type Item = Transition<O, A>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let is_done = tr.is_done;
        self.current.push(tr);
        if is_done || self.current.len() >= self.max_episode_length {
            self.close_trajectory();
        }
        Ok(())
    }

    /// Returns the number of stored trajectories.
    fn len(&self) -> usize {
        self.trajectories.len()
    }
}

impl<O: Clone, A: Clone> ReplayBufferBase for EpisodicMemory<O, A> {
    type Config = EpisodicMemoryConfig;
    type Batch = EpisodicBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.max_episode_length == 0 {
            return Err(RdpgError::InvalidConfig("max_episode_length must be positive".into()).into());
        }
        let num_trajectories = config.num_trajectories();
        if num_trajectories == 0 {
            return Err(RdpgError::InvalidConfig(format!(
                "capacity {} cannot hold a trajectory of length {}",
                config.capacity, config.max_episode_length
            ))
            .into());
        }

        Ok(Self {
            num_trajectories,
            max_episode_length: config.max_episode_length,
            max_sample_len: config.max_sample_len,
            trajectories: VecDeque::with_capacity(num_trajectories),
            current: Vec::with_capacity(config.max_episode_length),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let n = self.trajectories.len();
        if size == 0 || n < size {
            trace!("Not enough trajectories: {} < {}", n, size);
            return Ok(EpisodicBatch::empty());
        }

        // Segments shorter than the window, such as the tail of an episode,
        // are not sampled while longer ones are stored.
        let longest = self.trajectories.iter().map(|t| t.len()).max().unwrap_or(0);
        let len = match self.max_sample_len {
            Some(m) => longest.min(m + 1),
            None => longest,
        };
        let eligible = self
            .trajectories
            .iter()
            .enumerate()
            .filter(|(_, t)| t.len() >= len)
            .map(|(ix, _)| ix)
            .collect::<Vec<_>>();
        let ixs = (0..size)
            .map(|_| eligible[self.rng.gen_range(0..eligible.len())])
            .collect::<Vec<_>>();

        // Start of the window in each sampled trajectory
        let offsets = ixs
            .iter()
            .map(|&ix| {
                let slack = self.trajectories[ix].len() - len;
                match self.max_sample_len {
                    Some(_) if slack > 0 => self.rng.gen_range(0..=slack),
                    _ => 0,
                }
            })
            .collect::<Vec<_>>();

        let steps = (0..len)
            .map(|t| {
                ixs.iter()
                    .zip(offsets.iter())
                    .map(|(&ix, &off)| self.trajectories[ix][off + t].clone())
                    .collect()
            })
            .collect();

        Ok(EpisodicBatch::new(steps))
    }
}
