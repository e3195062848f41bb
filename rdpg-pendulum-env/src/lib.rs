//! Inverted pendulum swing-up as an [`Env`](rdpg_core::Env).
//!
//! The dynamics follow the classic pendulum task: a torque-limited pendulum
//! starts at a random angle and is rewarded for standing upright with little
//! velocity and effort. By default the angular velocity is hidden from the
//! observation, so a recurrent policy has to infer it from the history of
//! observations.
mod config;
mod env;
pub use config::PendulumConfig;
pub use env::{PendulumAct, PendulumEnv, PendulumObs};
