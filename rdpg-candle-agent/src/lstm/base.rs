use super::LstmActorConfig;
use crate::model::RecurrentSubModel;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{
    linear,
    rnn::{lstm, LSTMConfig, LSTMState, LSTM, RNN},
    Linear, Module, VarBuilder,
};

/// Deterministic actor: linear, ReLU, LSTM cell, linear and tanh.
///
/// Actions are in `[-1, 1]`.
pub struct LstmActor {
    device: Device,
    fc1: Linear,
    lstm: LSTM,
    fc2: Linear,
}

impl RecurrentSubModel for LstmActor {
    type Config = LstmActorConfig;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let fc1 = linear(config.in_dim, config.hidden_dim, vb.pp("fc1"))?;
        let lstm = lstm(
            config.hidden_dim,
            config.lstm_dim,
            LSTMConfig::default(),
            vb.pp("lstm"),
        )?;
        let fc2 = linear(config.lstm_dim, config.out_dim, vb.pp("fc2"))?;

        Ok(Self {
            device,
            fc1,
            lstm,
            fc2,
        })
    }

    fn zero_state(&self, batch_size: usize) -> Result<LSTMState> {
        Ok(self.lstm.zero_state(batch_size)?)
    }

    fn step(&self, xs: &Tensor, state: &LSTMState) -> Result<(Tensor, LSTMState)> {
        let xs = xs.to_device(&self.device)?;
        let xs = self.fc1.forward(&xs)?.relu()?;
        let state = self.lstm.step(&xs, state)?;
        let act = self.fc2.forward(state.h())?.tanh()?;
        Ok((act, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    fn actor() -> Result<LstmActor> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        LstmActor::build(vb, LstmActorConfig::new(3, 8, 4, 2))
    }

    #[test]
    fn test_step_shape_and_range() -> Result<()> {
        let actor = actor()?;
        let state = actor.zero_state(5)?;
        assert_eq!(state.h().dims(), [5, 4]);

        let xs = Tensor::randn(0f32, 10f32, (5, 3), &Device::Cpu)?;
        let (act, state) = actor.step(&xs, &state)?;
        assert_eq!(act.dims(), [5, 2]);
        assert_eq!(state.c().dims(), [5, 4]);
        let act = act.flatten_all()?.to_vec1::<f32>()?;
        assert!(act.iter().all(|a| (-1.0..=1.0).contains(a)));
        Ok(())
    }

    #[test]
    fn test_state_is_carried() -> Result<()> {
        let actor = actor()?;
        let xs = Tensor::ones((1, 3), DType::F32, &Device::Cpu)?;
        let state0 = actor.zero_state(1)?;
        let (a1, state1) = actor.step(&xs, &state0)?;
        let (a2, _) = actor.step(&xs, &state1)?;

        // same input, different recurrent states
        let (a1_, _) = actor.step(&xs, &state0)?;
        let d_same = (&a1 - &a1_)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        let d_next = (&a1 - &a2)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert_eq!(d_same, 0.0);
        assert!(d_next > 0.0);
        Ok(())
    }
}
