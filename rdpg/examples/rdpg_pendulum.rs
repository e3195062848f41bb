use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use rdpg::{
    rdpg_candle_agent::{
        lstm::{LstmActor, LstmActorConfig},
        mlp::{Mlp, MlpConfig},
        opt::OptimizerConfig,
        rdpg::{ActorConfig, CriticConfig, OuConfig, Rdpg, RdpgConfig},
        Device,
    },
    rdpg_core::{
        episodic_memory::{EpisodicMemory, EpisodicMemoryConfig},
        Agent, Configurable, DefaultEvaluator, DeterministicPolicy, Env as _, Evaluator as _,
        ReplayBufferBase, Trainer, TrainerConfig,
    },
    rdpg_pendulum_env::{PendulumAct, PendulumConfig, PendulumEnv, PendulumObs},
    rdpg_tensorboard::TensorboardRecorder,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

type Env = PendulumEnv;
type RdpgAgent = Rdpg<Env, LstmActor, Mlp>;
type Memory = EpisodicMemory<PendulumObs, PendulumAct>;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Mode {
    Train,
    Test,
}

/// Train/test RDPG agent in pendulum environment without velocity observation
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train or test
    #[arg(long, value_enum, default_value_t = Mode::Train)]
    mode: Mode,

    /// Hidden units of the first layers
    #[arg(long, default_value_t = 400)]
    hidden1: usize,

    /// Hidden units of the second layers, also the size of the recurrent state
    #[arg(long, default_value_t = 300)]
    hidden2: usize,

    /// Learning rate of the critic and the reward predictor
    #[arg(long, default_value_t = 1e-3)]
    rate: f64,

    /// Learning rate of the actor
    #[arg(long, default_value_t = 1e-4)]
    prate: f64,

    /// Environment steps with random actions before training
    #[arg(long, default_value_t = 100)]
    warmup: usize,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    discount: f64,

    /// Number of trajectories in a batch
    #[arg(long, default_value_t = 64)]
    bsize: usize,

    /// Capacity of the memory in transitions
    #[arg(long, default_value_t = 600_000)]
    rmsize: usize,

    /// Rate of the soft update of target networks
    #[arg(long, default_value_t = 0.001)]
    tau: f64,

    /// Rate of mean reversion of the exploration noise
    #[arg(long, default_value_t = 0.15)]
    ou_theta: f64,

    /// Scale of the exploration noise
    #[arg(long, default_value_t = 0.2)]
    ou_sigma: f64,

    /// Mean of the exploration noise
    #[arg(long, default_value_t = 0.0)]
    ou_mu: f64,

    /// Episodes per evaluation
    #[arg(long, default_value_t = 20)]
    validate_episodes: usize,

    /// Maximum length of a rollout
    #[arg(long, default_value_t = 500)]
    max_episode_length: usize,

    /// Length of the trajectory segments stored in the memory
    #[arg(long, default_value_t = 5)]
    trajectory_length: usize,

    /// Evaluate the agent if positive
    #[arg(long, default_value_t = 2000)]
    validate_steps: usize,

    /// Directory in which run directories are created
    #[arg(long, default_value = "output")]
    output: String,

    /// Number of environment steps of training
    #[arg(long, default_value_t = 200_000)]
    train_iter: usize,

    /// Number of noisy actions over which the exploration noise decays
    #[arg(long, default_value_t = 50_000)]
    epsilon: usize,

    /// Random seed, drawn at random if negative
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    seed: i64,

    /// Directory of the model parameters to test
    #[arg(long)]
    resume: Option<String>,

    /// YAML file of the agent configuration, overriding the network options
    #[arg(long)]
    config: Option<String>,

    /// Length of episodes of the environment
    #[arg(long, default_value_t = 200)]
    env_max_steps: usize,

    /// Observe the angular velocity
    #[arg(long, default_value_t = false)]
    observe_velocity: bool,

    /// Run the networks on the GPU
    #[arg(long, default_value_t = false)]
    cuda: bool,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

/// Returns `<output>/Pendulum-run<N>` with the next free run number.
fn output_folder(output: &str) -> Result<PathBuf> {
    fs::create_dir_all(output)?;
    let prefix = "Pendulum-run";
    let mut n = 0;
    for entry in fs::read_dir(output)? {
        let name = entry?.file_name();
        if let Some(id) = name
            .to_str()
            .and_then(|s| s.strip_prefix(prefix))
            .and_then(|s| s.parse::<usize>().ok())
        {
            n = n.max(id + 1);
        }
    }
    let path = Path::new(output).join(format!("{}{}", prefix, n));
    fs::create_dir_all(&path)?;
    Ok(path)
}

fn seed(args: &Args) -> i64 {
    match args.seed >= 0 {
        true => args.seed,
        false => fastrand::i64(0..i64::MAX),
    }
}

fn env_config(args: &Args) -> PendulumConfig {
    PendulumConfig::default()
        .max_steps(args.env_max_steps)
        .observe_velocity(args.observe_velocity)
}

fn agent_config(
    args: &Args,
    env_config: &PendulumConfig,
) -> Result<RdpgConfig<LstmActorConfig, MlpConfig>> {
    if let Some(path) = &args.config {
        return RdpgConfig::load(path);
    }
    let obs_dim = env_config.obs_dim();
    let act_dim = env_config.act_dim();
    let q_config = MlpConfig::new(
        obs_dim + act_dim,
        vec![args.hidden1, args.hidden2],
        1,
        false,
    );
    let actor_config = ActorConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: args.prate })
        .pi_config(LstmActorConfig::new(
            obs_dim,
            args.hidden1,
            args.hidden2,
            act_dim,
        ));
    let critic_config = CriticConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: args.rate })
        .q_config(q_config);
    let ou_config = OuConfig::default()
        .theta(args.ou_theta)
        .sigma(args.ou_sigma)
        .mu(args.ou_mu);
    let device = match args.cuda {
        true => Device::Cuda(0),
        false => Device::Cpu,
    };

    Ok(RdpgConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config.clone())
        .reward_predictor_config(critic_config)
        .ou_config(ou_config)
        .epsilon_decay_steps(args.epsilon)
        .device(device))
}

fn train(args: &Args) -> Result<PathBuf> {
    let model_dir = output_folder(&args.output)?;
    let seed = seed(args);
    info!("Output directory: {:?}, seed = {}", model_dir, seed);

    let env_config = env_config(args);
    let agent_config = agent_config(args, &env_config)?;
    let memory_config = EpisodicMemoryConfig::default()
        .capacity(args.rmsize)
        .max_episode_length(args.trajectory_length)
        .seed(seed as u64);
    let trainer_config = TrainerConfig::default()
        .max_steps(args.train_iter)
        .warmup(args.warmup)
        .trajectory_length(args.trajectory_length)
        .max_episode_length(args.max_episode_length)
        .batch_size(args.bsize)
        .discount(args.discount)
        .tau(args.tau)
        .validate_steps(args.validate_steps)
        .model_dir(model_dir.to_string_lossy());
    env_config.save(model_dir.join("env_config.yaml"))?;
    agent_config.save(model_dir.join("agent_config.yaml"))?;
    memory_config.save(model_dir.join("memory_config.yaml"))?;
    trainer_config.save(model_dir.join("trainer_config.yaml"))?;

    let mut env = Env::build(&env_config, seed)?;
    let mut agent = RdpgAgent::build(agent_config)?;
    let mut memory = Memory::build(&memory_config)?;
    let mut trainer = Trainer::build(trainer_config);
    let mut recorder = TensorboardRecorder::new(&model_dir);
    let mut evaluator = DefaultEvaluator::new(
        args.validate_episodes,
        args.validate_steps,
        Some(args.max_episode_length),
    );

    trainer.train(
        &mut env,
        &mut agent,
        &mut memory,
        &mut recorder,
        &mut evaluator,
    )?;
    evaluator.save_results(model_dir.join("validate_reward.csv"))?;

    Ok(model_dir)
}

fn test(args: &Args, n_runs: usize) -> Result<Vec<f32>> {
    let model_dir = args
        .resume
        .as_ref()
        .context("--resume is required in test mode")?;
    let model_dir = Path::new(model_dir);
    let env_config = match model_dir.join("env_config.yaml") {
        path if path.exists() => PendulumConfig::load(path)?,
        _ => env_config(args),
    };
    let mut env = Env::build(&env_config, seed(args))?;
    let agent_config = match model_dir.join("agent_config.yaml") {
        path if path.exists() => RdpgConfig::load(path)?,
        _ => agent_config(args, &env_config)?,
    };
    let mut agent = RdpgAgent::build(agent_config)?;
    agent.load_params(model_dir)?;
    agent.eval();

    let mut evaluator = DefaultEvaluator::new(
        args.validate_episodes,
        0,
        Some(args.max_episode_length),
    );
    let mut rewards = vec![];
    for i in 0..n_runs {
        let reward = evaluator.evaluate(&mut env, &mut DeterministicPolicy::new(&mut agent))?;
        info!("[Evaluate] #{}: mean_reward = {}", i, reward);
        rewards.push(reward);
    }

    Ok(rewards)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.debug {
        true => "debug",
        false => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.mode {
        Mode::Train => {
            train(&args)?;
        }
        Mode::Test => {
            test(&args, args.validate_episodes)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_rdpg_pendulum() -> Result<()> {
        let output = TempDir::new("rdpg_pendulum")?;
        let output = output.path().to_string_lossy().to_string();
        let args = Args::parse_from([
            "rdpg_pendulum",
            "--hidden1",
            "16",
            "--hidden2",
            "8",
            "--bsize",
            "4",
            "--warmup",
            "20",
            "--train-iter",
            "300",
            "--max-episode-length",
            "30",
            "--env-max-steps",
            "10",
            "--validate-steps",
            "1",
            "--validate-episodes",
            "1",
            "--seed",
            "1",
            "--output",
            output.as_str(),
        ]);
        let model_dir = train(&args)?;
        assert!(model_dir.ends_with("Pendulum-run0"));
        assert!(model_dir.join("actor.pt").exists());
        assert!(model_dir.join("validate_reward.csv").exists());
        assert!(fs::read_to_string(model_dir.join("validate_reward.csv"))?.lines().count() > 1);

        let args = Args {
            mode: Mode::Test,
            resume: Some(model_dir.to_string_lossy().to_string()),
            ..args
        };
        let rewards = test(&args, 2)?;
        assert_eq!(rewards.len(), 2);

        // evaluation episodes are reset by index, so the runs are identical
        assert_eq!(rewards[0], rewards[1]);
        Ok(())
    }
}
