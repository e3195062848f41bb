//! Exploration noise of RDPG.
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};

/// Configuration of [`OrnsteinUhlenbeck`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct OuConfig {
    /// Rate of mean reversion.
    pub theta: f64,

    /// Long-run mean.
    pub mu: f64,

    /// Scale of the Gaussian increments.
    pub sigma: f64,

    /// Time step of the discretization.
    pub dt: f64,
}

impl Default for OuConfig {
    fn default() -> Self {
        Self {
            theta: 0.15,
            mu: 0.0,
            sigma: 0.2,
            dt: 1e-2,
        }
    }
}

impl OuConfig {
    /// Sets the rate of mean reversion.
    pub fn theta(mut self, v: f64) -> Self {
        self.theta = v;
        self
    }

    /// Sets the long-run mean.
    pub fn mu(mut self, v: f64) -> Self {
        self.mu = v;
        self
    }

    /// Sets the scale of the increments.
    pub fn sigma(mut self, v: f64) -> Self {
        self.sigma = v;
        self
    }
}

/// Ornstein-Uhlenbeck process.
///
/// `x <- x + theta * (mu - x) * dt + sigma * sqrt(dt) * N(0, 1)`, starting from zero.
pub struct OrnsteinUhlenbeck {
    config: OuConfig,
    x: Option<Tensor>,
}

impl OrnsteinUhlenbeck {
    /// Constructs the process.
    pub fn new(config: OuConfig) -> Self {
        Self { config, x: None }
    }

    /// Advances the process and returns the new value with shape `dims`.
    pub fn sample(&mut self, dims: &[usize], device: &Device) -> Result<Tensor> {
        let OuConfig {
            theta,
            mu,
            sigma,
            dt,
        } = self.config;
        let x = match self.x.take() {
            Some(x) if x.dims() == dims => x,
            _ => Tensor::zeros(dims, DType::F32, device)?,
        };
        let z = Tensor::randn(0f32, 1f32, dims, device)?;
        let drift = ((mu - &x)? * (theta * dt))?;
        let x = ((&x + drift)? + (z * (sigma * dt.sqrt()))?)?;
        self.x = Some(x.clone());
        Ok(x)
    }

    /// Sets the process back to zero.
    pub fn reset(&mut self) {
        self.x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_reversion_without_noise() -> Result<()> {
        let config = OuConfig::default().sigma(0.0).mu(1.0).theta(10.0);
        let mut ou = OrnsteinUhlenbeck::new(config);

        // x_1 = 0 + 10 * (1 - 0) * 0.01
        let x = ou.sample(&[1, 2], &Device::Cpu)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(x.iter().all(|v| (v - 0.1).abs() < 1e-6));

        // x_2 = 0.1 + 10 * (1 - 0.1) * 0.01
        let x = ou.sample(&[1, 2], &Device::Cpu)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(x.iter().all(|v| (v - 0.19).abs() < 1e-6));

        ou.reset();
        let x = ou.sample(&[1, 2], &Device::Cpu)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(x.iter().all(|v| (v - 0.1).abs() < 1e-6));
        Ok(())
    }
}
