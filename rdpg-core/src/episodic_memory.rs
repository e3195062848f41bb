//! Replay memory storing whole trajectories.
//!
//! [`EpisodicMemory`] cuts the stream of pushed [`Transition`]s into trajectories
//! and samples batches of them laid out time-major, as required by recurrent
//! networks trained with truncated backpropagation through time.
//!
//! [`Transition`]: crate::Transition
mod base;
mod config;
pub use base::EpisodicMemory;
pub use config::EpisodicMemoryConfig;
