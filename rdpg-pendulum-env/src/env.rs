use crate::PendulumConfig;
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rdpg_core::{record::Record, Act, Env, Obs, Step};
use std::f32::consts::PI;

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const MASS: f32 = 1.0;
const LENGTH: f32 = 1.0;

/// Observation of [`PendulumEnv`]: `[cos(theta), sin(theta)]`, followed by the
/// angular velocity if it is observed.
#[derive(Clone, Debug, PartialEq)]
pub struct PendulumObs(pub Vec<f32>);

impl Obs for PendulumObs {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<[f32]> for PendulumObs {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Action of [`PendulumEnv`]: the torque scaled to `[-1, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PendulumAct(pub Vec<f32>);

impl Act for PendulumAct {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<[f32]> for PendulumAct {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for PendulumAct {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

fn initial_state(rng: &mut StdRng) -> (f32, f32) {
    (rng.gen_range(-PI..PI), rng.gen_range(-1.0..1.0))
}

/// Pendulum swing-up.
///
/// [`Env::reset_with_index`] draws the initial state from an RNG seeded with
/// `seed + ix`, so evaluation episodes are reproducible and do not disturb the
/// RNG of training episodes.
pub struct PendulumEnv {
    config: PendulumConfig,
    seed: u64,
    rng: StdRng,
    theta: f32,
    theta_dot: f32,
    steps: usize,
}

impl PendulumEnv {
    fn observe(&self) -> PendulumObs {
        let mut obs = vec![self.theta.cos(), self.theta.sin()];
        if self.config.observe_velocity {
            obs.push(self.theta_dot);
        }
        PendulumObs(obs)
    }

    fn reset_to(&mut self, (theta, theta_dot): (f32, f32)) -> PendulumObs {
        self.theta = theta;
        self.theta_dot = theta_dot;
        self.steps = 0;
        self.observe()
    }
}

impl Env for PendulumEnv {
    type Config = PendulumConfig;
    type Obs = PendulumObs;
    type Act = PendulumAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let seed = seed as u64;
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let u = a.0.first().copied().unwrap_or_default() * MAX_TORQUE;
        let u = u.clamp(-MAX_TORQUE, MAX_TORQUE);
        let (th, thdot) = (self.theta, self.theta_dot);
        let g = self.config.g;

        let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

        let thdot = thdot
            + (3.0 * g / (2.0 * LENGTH) * th.sin() + 3.0 / (MASS * LENGTH.powi(2)) * u) * DT;
        let thdot = thdot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = th + thdot * DT;
        self.theta_dot = thdot;
        self.steps += 1;
        trace!("theta = {}, theta_dot = {}", self.theta, self.theta_dot);

        let is_done = self.steps >= self.config.max_steps;
        let step = Step::new(self.observe(), a.clone(), -cost, is_done, ());
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        let state = initial_state(&mut self.rng);
        Ok(self.reset_to(state))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        let state = initial_state(&mut rng);
        Ok(self.reset_to(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn env(config: PendulumConfig) -> PendulumEnv {
        PendulumEnv::build(&config, 42).unwrap()
    }

    fn act(v: f32) -> PendulumAct {
        PendulumAct(vec![v])
    }

    #[test]
    fn test_partial_observation() -> Result<()> {
        let mut e = env(PendulumConfig::default());
        let obs = e.reset()?;
        assert_eq!(obs.len(), 2);
        let norm = obs.0[0].powi(2) + obs.0[1].powi(2);
        assert!((norm - 1.0).abs() < 1e-5);

        let mut e = env(PendulumConfig::default().observe_velocity(true));
        assert_eq!(e.reset()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_upright_is_stable() -> Result<()> {
        let mut e = env(PendulumConfig::default());
        e.theta = 0.0;
        e.theta_dot = 0.0;
        let (step, _) = e.step(&act(0.0))?;
        assert_eq!(step.reward, 0.0);
        assert_eq!(step.obs.0, vec![1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_dynamics() -> Result<()> {
        let mut e = env(PendulumConfig::default());
        e.theta = PI / 2.0;
        e.theta_dot = 0.0;
        let (step, _) = e.step(&act(0.0))?;

        // thdot = 3 * 10 / 2 * sin(pi / 2) * 0.05
        assert!((e.theta_dot - 0.75).abs() < 1e-5);
        assert!((e.theta - (PI / 2.0 + 0.0375)).abs() < 1e-5);
        assert!((step.reward + (PI / 2.0).powi(2)).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_torque_is_clipped() -> Result<()> {
        let mut e = env(PendulumConfig::default());
        e.theta = 0.0;
        e.theta_dot = 0.0;
        let (step, _) = e.step(&act(5.0))?;

        // u = 2, thdot = 3 * 2 * 0.05
        assert!((step.reward + 0.004).abs() < 1e-6);
        assert!((e.theta_dot - 0.3).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_episode_length() -> Result<()> {
        let mut e = env(PendulumConfig::default().max_steps(3));
        e.reset()?;
        let dones = (0..3)
            .map(|_| Ok(e.step(&act(0.0))?.0.is_done))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(dones, vec![false, false, true]);

        e.reset()?;
        assert!(!e.step(&act(0.0))?.0.is_done);
        Ok(())
    }

    #[test]
    fn test_reset_with_index() -> Result<()> {
        let mut e1 = env(PendulumConfig::default());
        let mut e2 = env(PendulumConfig::default());

        assert_eq!(e1.reset_with_index(3)?, e2.reset_with_index(3)?);
        assert_ne!(e1.reset_with_index(3)?, e1.reset_with_index(4)?);

        // evaluation resets leave the training RNG untouched
        assert_eq!(e1.reset()?, e2.reset()?);
        Ok(())
    }
}
