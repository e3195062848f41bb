//! Recurrent deterministic policy gradient (RDPG) agent.
mod actor;
mod base;
mod config;
mod critic;
mod explorer;
mod reward_predictor;
pub use actor::{Actor, ActorConfig};
pub use base::Rdpg;
pub use config::RdpgConfig;
pub use critic::{Critic, CriticConfig};
pub use explorer::{OrnsteinUhlenbeck, OuConfig};
pub use reward_predictor::RewardPredictor;
