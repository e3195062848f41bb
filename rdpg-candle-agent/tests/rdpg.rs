use anyhow::Result;
use candle_nn::VarMap;
use rdpg_candle_agent::{
    lstm::{LstmActor, LstmActorConfig},
    mlp::{Mlp, MlpConfig},
    rdpg::{ActorConfig, CriticConfig, Rdpg, RdpgConfig},
};
use rdpg_core::{
    dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs},
    episodic_memory::{EpisodicMemory, EpisodicMemoryConfig},
    record::Aggregator,
    trainer::update_policy,
    Agent, Configurable, Env, ExperienceBufferBase, Policy, RecurrentActorCritic,
    ReplayBufferBase, Transition,
};
use std::collections::BTreeMap;
use tempdir::TempDir;
use test_log::test;

type Agent_ = Rdpg<DummyEnv, LstmActor, Mlp>;

fn config() -> RdpgConfig<LstmActorConfig, MlpConfig> {
    RdpgConfig::default()
        .actor_config(ActorConfig::default().pi_config(LstmActorConfig::new(1, 16, 8, 1)))
        .critic_config(CriticConfig::default().q_config(MlpConfig::new(2, vec![16, 16], 1, false)))
        .reward_predictor_config(
            CriticConfig::default().q_config(MlpConfig::new(2, vec![16], 1, false)),
        )
        .epsilon_decay_steps(10)
}

fn snapshot(vm: &VarMap) -> BTreeMap<String, Vec<f32>> {
    vm.data()
        .lock()
        .unwrap()
        .iter()
        .map(|(k, v)| {
            let t = v.as_tensor().flatten_all().unwrap();
            (k.clone(), t.to_vec1::<f32>().unwrap())
        })
        .collect()
}

fn max_abs_diff(a: &BTreeMap<String, Vec<f32>>, b: &BTreeMap<String, Vec<f32>>) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .flat_map(|(k, xs)| xs.iter().zip(b[k].iter()).map(|(x, y)| (x - y).abs()))
        .fold(0f32, f32::max)
}

fn rollout(agent: &mut Agent_, n: usize) -> Result<Vec<f32>> {
    Policy::<DummyEnv>::reset(agent)?;
    (0..n)
        .map(|t| Ok(agent.select_action(&DummyObs(t as f32), false, false)?.0))
        .collect()
}

fn memory(n_episodes: usize, len: usize) -> Result<EpisodicMemory<DummyObs, DummyAct>> {
    let mem_config = EpisodicMemoryConfig::default()
        .capacity(1000)
        .max_episode_length(len);
    let mut memory = EpisodicMemory::build(&mem_config)?;
    let mut env = DummyEnv::build(&DummyEnvConfig::default(), 0)?;
    let mut agent = Agent_::build(config())?;
    for _ in 0..n_episodes {
        let mut obs = env.reset()?;
        for _ in 0..len {
            let act = agent.random_action()?;
            let (step, _) = env.step(&act)?;
            memory.push(Transition::new(obs, act, step.reward, step.is_done))?;
            obs = step.obs;
        }
    }
    Ok(memory)
}

#[test]
fn test_actions_in_range() -> Result<()> {
    let mut agent = Agent_::build(config())?;

    for t in 0..20 {
        let a = agent.random_action()?.0;
        assert!((-1.0..=1.0).contains(&a));
        let a = agent.select_action(&DummyObs(t as f32 * 10.0), true, true)?.0;
        assert!((-1.0..=1.0).contains(&a));
    }
    Ok(())
}

#[test]
fn test_epsilon_decay() -> Result<()> {
    let mut agent = Agent_::build(config())?;

    for _ in 0..3 {
        agent.select_action(&DummyObs(0.0), true, true)?;
    }
    agent.select_action(&DummyObs(0.0), false, true)?;
    assert!((agent.epsilon() - 0.7).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_deterministic_in_eval_mode() -> Result<()> {
    let mut agent = Agent_::build(config())?;
    agent.eval();

    let a1 = rollout(&mut agent, 5)?;
    let a2 = rollout(&mut agent, 5)?;
    assert_eq!(a1, a2);

    // noise is disabled outside of training mode
    Policy::<DummyEnv>::reset(&mut agent)?;
    let a3 = (0..5)
        .map(|t| Ok(agent.sample(&DummyObs(t as f32))?.0))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(a1, a3);
    Ok(())
}

#[test]
fn test_soft_reset_clears_recurrent_state() -> Result<()> {
    let mut agent = Agent_::build(config())?;
    let a1 = rollout(&mut agent, 1)?;

    agent.select_action(&DummyObs(3.0), false, false)?;
    agent.reset_hidden_state(false)?;
    let a2 = agent.select_action(&DummyObs(0.0), false, false)?.0;
    assert_eq!(a1[0], a2);
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    let dir = TempDir::new("rdpg")?;
    let mut agent = Agent_::build(config())?;
    let actions = rollout(&mut agent, 6)?;
    agent.save_params(dir.path())?;

    for name in ["actor.pt", "actor_tgt.pt", "critic.pt", "critic_tgt.pt", "reward_predictor.pt"] {
        assert!(dir.path().join(name).exists());
    }

    let mut agent_ = Agent_::build(config())?;
    agent_.load_params(dir.path())?;
    let actions_ = rollout(&mut agent_, 6)?;
    assert_eq!(actions, actions_);

    let d = max_abs_diff(
        &snapshot(agent.critic().varmap_tgt()),
        &snapshot(agent_.critic().varmap_tgt()),
    );
    assert_eq!(d, 0.0);
    Ok(())
}

#[test]
fn test_targets_start_as_copies() -> Result<()> {
    let agent = Agent_::build(config())?;

    let actor = agent.actor();
    assert_eq!(max_abs_diff(&snapshot(actor.varmap()), &snapshot(actor.varmap_tgt())), 0.0);
    let critic = agent.critic();
    assert_eq!(max_abs_diff(&snapshot(critic.varmap()), &snapshot(critic.varmap_tgt())), 0.0);
    Ok(())
}

#[test]
fn test_update_policy() -> Result<()> {
    let tau = 0.1;
    let mut memory = memory(4, 5)?;
    let mut agent = Agent_::build(config())?;
    let critic_before = snapshot(agent.critic().varmap());
    let critic_tgt_before = snapshot(agent.critic().varmap_tgt());
    let mut agg = Aggregator::default();

    let n = update_policy(&mut agent, &mut memory, 3, 0.99, tau, Some(&mut agg))?;

    assert_eq!(n, 4);
    for key in ["prediction_loss", "value_loss", "policy_loss"] {
        assert_eq!(agg.count(key), 4);
        assert!(agg.mean(key).is_finite());
    }

    // the online critic has moved and the target follows it by tau
    let critic_after = snapshot(agent.critic().varmap());
    assert!(max_abs_diff(&critic_before, &critic_after) > 0.0);
    let critic_tgt_after = snapshot(agent.critic().varmap_tgt());
    for (k, tgt) in critic_tgt_after.iter() {
        for ((x, old), new) in tgt
            .iter()
            .zip(critic_tgt_before[k].iter())
            .zip(critic_after[k].iter())
        {
            let expected = tau as f32 * new + (1.0 - tau as f32) * old;
            assert!((x - expected).abs() < 1e-5);
        }
    }
    Ok(())
}

#[test]
fn test_soft_update_bounds() -> Result<()> {
    let mut memory = memory(2, 4)?;
    let mut agent = Agent_::build(config())?;
    update_policy(&mut agent, &mut memory, 2, 0.99, 0.0, None)?;

    // tau = 0 keeps the targets, tau = 1 copies the online networks
    let actor = agent.actor();
    assert!(max_abs_diff(&snapshot(actor.varmap()), &snapshot(actor.varmap_tgt())) > 0.0);
    agent.soft_update(1.0)?;
    let actor = agent.actor();
    assert_eq!(max_abs_diff(&snapshot(actor.varmap()), &snapshot(actor.varmap_tgt())), 0.0);
    Ok(())
}

#[test]
fn test_recurrent_state_of_update() -> Result<()> {
    let agent = Agent_::build(config())?;
    let hidden = agent.zero_hidden(3)?;
    assert_eq!(hidden.h().dims(), [3, 8]);
    assert_eq!(hidden.c().dims(), [3, 8]);
    Ok(())
}
