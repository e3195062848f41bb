//! Interface of neural networks used in the agent.
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{rnn::LSTMState, VarBuilder};

/// Neural network model not owing its [`VarMap`] internally, taking two inputs.
///
/// Used for the critic and the reward predictor, which take observations and actions.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel2: Sized {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Builds [`SubModel2`] with [`VarBuilder`] and [`SubModel2::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>;

    /// Outputs a tensor of shape `(batch_size, out_dim)`.
    fn forward(&self, input1: &Tensor, input2: &Tensor) -> Result<Tensor>;
}

/// Recurrent neural network model not owing its [`VarMap`] internally.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait RecurrentSubModel: Sized {
    /// Configuration from which [`RecurrentSubModel`] is constructed.
    type Config;

    /// Builds [`RecurrentSubModel`] with [`VarBuilder`] and [`RecurrentSubModel::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>;

    /// Returns the zero recurrent state for a batch.
    fn zero_state(&self, batch_size: usize) -> Result<LSTMState>;

    /// Advances the recurrent state by one time step.
    ///
    /// `xs` has shape `(batch_size, in_dim)`.
    fn step(&self, xs: &Tensor, state: &LSTMState) -> Result<(Tensor, LSTMState)>;
}
