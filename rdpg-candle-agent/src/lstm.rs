//! Recurrent actor with an LSTM cell.
mod base;
mod config;
pub use base::LstmActor;
pub use config::LstmActorConfig;
