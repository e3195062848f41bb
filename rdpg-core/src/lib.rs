#![warn(missing_docs)]
//! Core components for training recurrent deterministic policy gradient (RDPG) agents.
//!
//! * [`Trainer`] drives the rollout of an [`Agent`] in an [`Env`], pushes
//!   [`Transition`]s into an [`EpisodicMemory`] and schedules updates,
//!   checkpoints and evaluations.
//! * [`update_policy`] performs one update of a [`RecurrentActorCritic`] with a
//!   time-major batch of trajectories.
//! * [`record::Aggregator`] summarizes losses and returns between two reports.
//!
//! [`EpisodicMemory`]: episodic_memory::EpisodicMemory
//! [`update_policy`]: trainer::update_policy
pub mod dummy;
pub mod episodic_memory;
pub mod error;
pub mod record;

mod base;
pub use base::{
    Act, Agent, Configurable, EpisodicBatch, Env, ExperienceBufferBase, Info, Obs, Policy,
    RecurrentActorCritic, ReplayBufferBase, Step, TimeStepBatch, Transition,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, DeterministicPolicy, Evaluator};

pub mod trainer;
pub use trainer::{Trainer, TrainerConfig};
