//! Recurrent deterministic policy gradient (RDPG) in Rust.
//!
//! This crate collects the following crates:
//!
//! * [`rdpg_core`] provides the traits of environments and agents, the episodic
//!   memory, the training loop, the update algorithm and the metric aggregator.
//! * [`rdpg_candle_agent`] implements the RDPG agent with an LSTM actor based on
//!   [candle](https://crates.io/crates/candle-core).
//! * [`rdpg_pendulum_env`] is an inverted pendulum without velocity observation.
//! * [`rdpg_tensorboard`] writes training metrics to be shown in tensorboard.
//!
//! See `examples/rdpg_pendulum.rs` for a command line program training and
//! testing an agent.
pub use rdpg_candle_agent;
pub use rdpg_core;
pub use rdpg_pendulum_env;
pub use rdpg_tensorboard;
