use super::*;
use crate::{
    dummy::{DummyAct, DummyAgent, DummyEnv, DummyEnvConfig, DummyObs},
    episodic_memory::{EpisodicMemory, EpisodicMemoryConfig},
    record::{BufferedRecorder, NullRecorder},
    DefaultEvaluator,
};
use test_log::test;

type Tr = Transition<DummyObs, DummyAct>;

/// Episodic memory keeping a log of every pushed transition.
struct RecordingMemory {
    pushed: Vec<Tr>,
    inner: EpisodicMemory<DummyObs, DummyAct>,
}

impl ExperienceBufferBase for RecordingMemory {
    type Item = Tr;

    fn push(&mut self, tr: Tr) -> Result<()> {
        self.pushed.push(tr.clone());
        self.inner.push(tr)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl ReplayBufferBase for RecordingMemory {
    type Config = EpisodicMemoryConfig;
    type Batch = EpisodicBatch<DummyObs, DummyAct>;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            pushed: vec![],
            inner: EpisodicMemory::build(config)?,
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.inner.batch(size)
    }
}

struct Setup {
    trainer: Trainer,
    env: DummyEnv,
    agent: DummyAgent,
    memory: RecordingMemory,
}

fn run(config: TrainerConfig, episode_len: Option<usize>, agent: DummyAgent) -> Result<Setup> {
    let env_config = DummyEnvConfig { episode_len };
    let memory_config = EpisodicMemoryConfig::default()
        .capacity(1000)
        .max_episode_length(config.trajectory_length);
    let mut env = DummyEnv::build(&env_config, 0)?;
    let mut memory = RecordingMemory::build(&memory_config)?;
    let mut agent = agent;
    let mut trainer = Trainer::build(config);
    let mut evaluator = DefaultEvaluator::new(1, 1, Some(10));
    trainer.train(
        &mut env,
        &mut agent,
        &mut memory,
        &mut NullRecorder::new(),
        &mut evaluator,
    )?;

    Ok(Setup {
        trainer,
        env,
        agent,
        memory,
    })
}

fn config() -> TrainerConfig {
    TrainerConfig::default()
        .warmup(0)
        .batch_size(1)
        .validate_steps(0)
        .n_checkpoints(0)
        .max_episode_length(100)
        .trajectory_length(100)
}

#[test]
fn test_append_once_per_step_in_order() -> Result<()> {
    let s = run(config().max_steps(7), None, DummyAgent::default())?;

    assert_eq!(s.trainer.env_steps(), 7);
    assert_eq!(s.memory.pushed.len(), 7);
    for (i, tr) in s.memory.pushed.iter().enumerate() {
        // observation before the step
        assert_eq!(tr.obs, DummyObs(i as f32));
        assert_eq!(tr.reward, -((i + 1) as f32));
        assert!(!tr.is_done);
    }
    Ok(())
}

#[test]
fn test_trajectory_boundary() -> Result<()> {
    let s = run(
        config().max_steps(5).trajectory_length(5),
        None,
        DummyAgent::default(),
    )?;

    assert_eq!(s.agent.n_soft_resets, 1);
    assert_eq!(s.trainer.n_updates(), 1);
    assert_eq!(s.trainer.trajectory_steps(), 0);

    // a single stored trajectory of length 5
    assert_eq!(s.agent.n_critic_steps, 4);
    assert_eq!(s.agent.n_soft_updates, 1);
    Ok(())
}

#[test]
fn test_warmup_guard() -> Result<()> {
    let s = run(
        config().max_steps(50).warmup(100).trajectory_length(5),
        None,
        DummyAgent::default(),
    )?;

    assert_eq!(s.trainer.n_updates(), 0);
    assert_eq!(s.agent.n_soft_updates, 0);
    assert_eq!(s.agent.n_critic_steps, 0);
    assert_eq!(s.agent.n_soft_resets, 10);
    assert_eq!(s.agent.n_random_actions, 50);
    assert_eq!(s.agent.n_policy_actions, 0);
    Ok(())
}

#[test]
fn test_random_actions_during_warmup() -> Result<()> {
    let s = run(config().max_steps(6).warmup(3), None, DummyAgent::default())?;

    assert_eq!(s.agent.n_random_actions, 3);
    assert_eq!(s.agent.n_policy_actions, 3);
    let acts = s.memory.pushed.iter().map(|tr| tr.act.0).collect::<Vec<_>>();
    assert_eq!(acts, vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
    Ok(())
}

#[test]
fn test_update_step_count() -> Result<()> {
    let config = EpisodicMemoryConfig::default()
        .capacity(1000)
        .max_episode_length(6);
    let mut memory = EpisodicMemory::<DummyObs, DummyAct>::build(&config)?;
    for _ in 0..4 {
        for t in 0..6 {
            let tr = Transition::new(DummyObs(t as f32), DummyAct(0.0), 0.0, t == 5);
            memory.push(tr)?;
        }
    }
    let mut agent = DummyAgent::default();
    let mut agg = Aggregator::default();

    let n = update_policy(&mut agent, &mut memory, 4, 0.99, 0.01, Some(&mut agg))?;

    assert_eq!(n, 5);
    assert_eq!(agent.n_predictor_steps, 5);
    assert_eq!(agent.n_critic_steps, 5);
    assert_eq!(agent.n_actor_steps, 5);
    assert_eq!(agent.n_soft_updates, 1);

    // recurrent states are threaded through the time steps from zero
    assert_eq!(agent.actor_hidden, vec![0, 1, 2, 3, 4]);
    assert_eq!(*agent.target_hidden.borrow(), vec![0, 1, 2, 3, 4]);

    // losses are divided by the number of time steps
    assert!(agent.scales.iter().all(|s| (s - 1.0 / 6.0).abs() < 1e-12));
    assert_eq!(agg.count("value_loss"), 5);
    assert_eq!(agg.count("policy_loss"), 5);
    assert_eq!(agg.mean("prediction_loss"), 1.0);
    Ok(())
}

#[test]
fn test_updates_use_full_segments() -> Result<()> {
    // 7-step episodes leave 2-step tail segments in the memory
    let s = run(
        config()
            .max_steps(700)
            .max_episode_length(10)
            .trajectory_length(5)
            .batch_size(8),
        Some(7),
        DummyAgent::default(),
    )?;

    assert_eq!(s.trainer.episodes(), 100);
    assert!(s.agent.n_soft_updates > 100);
    assert_eq!(s.agent.n_critic_steps, 4 * s.agent.n_soft_updates);
    Ok(())
}

#[test]
fn test_update_with_insufficient_data() -> Result<()> {
    let config = EpisodicMemoryConfig::default()
        .capacity(1000)
        .max_episode_length(6);
    let mut memory = EpisodicMemory::<DummyObs, DummyAct>::build(&config)?;
    let mut agent = DummyAgent::default();

    let n = update_policy(&mut agent, &mut memory, 4, 0.99, 0.01, None)?;

    assert_eq!(n, 0);
    assert_eq!(agent.n_predictor_steps, 0);
    assert_eq!(agent.n_critic_steps, 0);
    assert_eq!(agent.n_soft_updates, 0);
    Ok(())
}

#[test]
fn test_toy_episode() -> Result<()> {
    let config = config()
        .max_steps(3)
        .max_episode_length(3)
        .trajectory_length(3);
    let s = run(config, Some(3), DummyAgent::default())?;

    assert_eq!(s.trainer.n_updates(), 1);
    assert_eq!(s.trainer.episodes(), 1);
    assert_eq!(s.agent.n_done_resets, 1);
    assert_eq!(s.agent.n_hard_resets, 1);

    let rewards = s.memory.pushed.iter().map(|tr| tr.reward).sum::<f32>();
    assert_eq!(rewards, -6.0);
    assert_eq!(s.trainer.aggregator().mean("reward"), rewards as f64);
    Ok(())
}

#[test]
fn test_evaluation_schedule() -> Result<()> {
    let config = config()
        .max_steps(40)
        .max_episode_length(10)
        .trajectory_length(2)
        .validate_steps(1)
        .eval_episode_interval(10);
    let memory_config = EpisodicMemoryConfig::default()
        .capacity(1000)
        .max_episode_length(2);
    let mut env = DummyEnv::build(&DummyEnvConfig { episode_len: Some(2) }, 0)?;
    let mut memory = EpisodicMemory::build(&memory_config)?;
    let mut agent = DummyAgent::default();
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::new(1, 1, Some(10));
    let mut trainer = Trainer::build(config);

    trainer.train(
        &mut env,
        &mut agent,
        &mut memory,
        &mut recorder,
        &mut evaluator,
    )?;

    assert_eq!(trainer.episodes(), 20);
    assert_eq!(recorder.len(), 2);
    assert_eq!(agent.n_deterministic_actions, 4);
    assert!(agent.is_train());
    assert!(trainer.aggregator().is_empty());

    for record in recorder.iter() {
        assert_eq!(record.get_scalar("train/reward")?, -3.0);
        assert_eq!(record.get_scalar("val/reward")?, -3.0);
        assert!(record.get_scalar("train/value_loss").is_ok());
        assert!(record.get_scalar("train/policy_loss").is_ok());
        assert!(record.get_scalar("train/prediction_loss").is_ok());
    }
    let steps = recorder
        .iter()
        .map(|r| r.get_scalar("env_steps"))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(steps, vec![20.0, 40.0]);
    Ok(())
}

#[test]
fn test_checkpoint_failure_is_not_fatal() -> Result<()> {
    let agent = DummyAgent {
        fail_save: true,
        ..DummyAgent::default()
    };
    let config = config().max_steps(9).n_checkpoints(3).model_dir("unused");
    let s = run(config, None, agent)?;

    assert_eq!(s.agent.n_saves.get(), 3);
    assert_eq!(s.trainer.env_steps(), 9);
    Ok(())
}

#[test]
fn test_length_bound_continues_episode() -> Result<()> {
    let s = run(
        config().max_steps(10).max_episode_length(4),
        None,
        DummyAgent::default(),
    )?;

    assert_eq!(s.env.n_resets, 1);
    assert_eq!(s.agent.n_hard_resets, 1);
    assert_eq!(s.trainer.episodes(), 0);
    assert!(s.trainer.aggregator().is_empty());
    Ok(())
}

#[test]
fn test_finalize_on_max_length() -> Result<()> {
    let s = run(
        config()
            .max_steps(10)
            .max_episode_length(4)
            .finalize_on_max_length(true),
        None,
        DummyAgent::default(),
    )?;

    assert_eq!(s.trainer.episodes(), 2);
    assert_eq!(s.env.n_resets, 3);
    assert_eq!(s.agent.n_done_resets, 2);
    assert!(s.memory.pushed[3].is_done);
    assert!(s.memory.pushed[7].is_done);
    assert_eq!(s.trainer.aggregator().count("reward"), 2);
    Ok(())
}

#[test]
fn test_invalid_config() {
    let env_config = DummyEnvConfig::default();
    let mut env = DummyEnv::build(&env_config, 0).unwrap();
    let mut memory = EpisodicMemory::build(&EpisodicMemoryConfig::default()).unwrap();
    let mut trainer = Trainer::build(config().batch_size(0));
    let res = trainer.train(
        &mut env,
        &mut DummyAgent::default(),
        &mut memory,
        &mut NullRecorder::new(),
        &mut DefaultEvaluator::new(1, 1, None),
    );
    assert!(res.is_err());
    assert_eq!(trainer.env_steps(), 0);
}
