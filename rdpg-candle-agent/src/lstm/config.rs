use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`LstmActor`](super::LstmActor).
pub struct LstmActorConfig {
    pub(super) in_dim: usize,
    pub(super) hidden_dim: usize,
    pub(super) lstm_dim: usize,
    pub(super) out_dim: usize,
}

impl LstmActorConfig {
    /// Creates configuration of the actor.
    ///
    /// * `hidden_dim` - Output dimension of the linear layer before the LSTM cell.
    /// * `lstm_dim` - Dimension of the recurrent state.
    pub fn new(in_dim: usize, hidden_dim: usize, lstm_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            hidden_dim,
            lstm_dim,
            out_dim,
        }
    }
}

impl OutDim for LstmActorConfig {
    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: usize) {
        self.out_dim = v;
    }
}
