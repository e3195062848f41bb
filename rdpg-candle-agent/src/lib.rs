//! Recurrent deterministic policy gradient (RDPG) agent implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! [`rdpg::Rdpg`] owns an LSTM actor, an MLP critic, an MLP reward predictor
//! and the target copies of the actor and the critic. It implements
//! [`Agent`](rdpg_core::Agent) for the rollout and
//! [`RecurrentActorCritic`](rdpg_core::RecurrentActorCritic) for
//! [`update_policy`](rdpg_core::trainer::update_policy).
pub mod lstm;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod rdpg;
pub mod util;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
