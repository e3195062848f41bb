//! Transitions and time-major batches of trajectories.

/// One environment step `(o_t, a_t, r_t, done_t)`.
///
/// `obs` is the observation before the action was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation before the step.
    pub obs: O,

    /// Action taken.
    pub act: A,

    /// Reward obtained.
    pub reward: f32,

    /// If the episode ended with this step.
    pub is_done: bool,
}

impl<O, A> Transition<O, A> {
    /// Constructs a transition.
    pub fn new(obs: O, act: A, reward: f32, is_done: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            is_done,
        }
    }
}

/// Trajectories sampled from an episodic memory, laid out time-major.
///
/// `steps[t][i]` is the `t`-th transition of the `i`-th sampled trajectory.
/// Every time step has the same number of transitions and index `i` refers to
/// the same trajectory at every time step.
#[derive(Clone, Debug)]
pub struct EpisodicBatch<O, A> {
    steps: Vec<Vec<Transition<O, A>>>,
}

impl<O, A> EpisodicBatch<O, A> {
    /// Constructs a batch from time-major transitions.
    ///
    /// Panics if time steps have different batch sizes.
    pub fn new(steps: Vec<Vec<Transition<O, A>>>) -> Self {
        if let Some(first) = steps.first() {
            let n = first.len();
            assert!(
                steps.iter().all(|s| s.len() == n),
                "All time steps must have the same batch size"
            );
        }
        Self { steps }
    }

    /// An empty batch, returned when the memory cannot provide enough trajectories.
    pub fn empty() -> Self {
        Self { steps: vec![] }
    }

    /// Returns the number of time steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the batch has no time step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of trajectories.
    pub fn batch_size(&self) -> usize {
        self.steps.first().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns the transitions at time step `t`.
    pub fn step(&self, t: usize) -> Option<&[Transition<O, A>]> {
        self.steps.get(t).map(|s| s.as_slice())
    }
}

impl<O: Clone, A: Clone> EpisodicBatch<O, A> {
    /// Gathers the inputs of one update step at time step `t`.
    ///
    /// `next_obs` is taken from time step `t + 1`, so `None` is returned for the
    /// last time step.
    pub fn time_step(&self, t: usize) -> Option<TimeStepBatch<O, A>> {
        let cur = self.steps.get(t)?;
        let next = self.steps.get(t + 1)?;

        Some(TimeStepBatch {
            obs: cur.iter().map(|tr| tr.obs.clone()).collect(),
            act: cur.iter().map(|tr| tr.act.clone()).collect(),
            reward: cur.iter().map(|tr| tr.reward).collect(),
            next_obs: next.iter().map(|tr| tr.obs.clone()).collect(),
        })
    }
}

/// Batched inputs of one update step, `(o_t, a_t, r_t, o_t+1)`.
#[derive(Clone, Debug)]
pub struct TimeStepBatch<O, A> {
    /// Observations at `t`.
    pub obs: Vec<O>,

    /// Actions at `t`.
    pub act: Vec<A>,

    /// Rewards at `t`.
    pub reward: Vec<f32>,

    /// Observations at `t + 1`.
    pub next_obs: Vec<O>,
}

impl<O, A> TimeStepBatch<O, A> {
    /// Returns the batch size.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
