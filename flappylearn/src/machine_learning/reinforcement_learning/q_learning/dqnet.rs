// q_learning.rs

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

use crate::machine_learning::reinforcement_learning::{
    environment::{Knowledge, RLAction, RLState},
    replay_buffer::ReplayBuffer,
    rl_error::{RLError, RLResult},
    rl_model::RLModel,
};

pub struct LearningRateScheduler {
    lr: f32,
    step_size: f32,
    curr_step: usize,
    update_interval: usize,
    warmup: usize,
}

impl LearningRateScheduler {
    pub fn new(initial: f32, step_size: f32, update_interval: usize, warmup: usize) -> Self {
        Self {
            lr: initial,
            step_size,
            curr_step: 0,
            update_interval: update_interval.max(1),
            warmup,
        }
    }

    /// Linear warm-up for the first `warmup` steps, then the rate is multiplied by `step_size`
    /// every `update_interval` steps.
    pub fn step(&mut self) -> f32 {
        self.curr_step += 1;
        if self.curr_step < self.warmup {
            self.lr * (self.curr_step as f32 / self.warmup as f32)
        } else if self.curr_step % self.update_interval == 0 {
            self.lr *= self.step_size;
            self.lr
        } else {
            self.lr
        }
    }

    pub fn current(&self) -> f32 {
        self.lr
    }
}

impl Default for LearningRateScheduler {
    fn default() -> Self {
        Self::new(0.001, 0.98, 10000, 200)
    }
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub gamma: f32,
    pub exploration_rate: f32,
    pub min_exploration_rate: f32,
    pub memory_size: usize,
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            exploration_rate: 1.0,
            min_exploration_rate: 0.01,
            memory_size: 50000,
            seed: 0,
        }
    }
}

/// Index of the highest value. Ties go to the lowest index.
pub fn arg_max(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((i, value)),
        })
        .map(|(i, _)| i)
}

/// Greedy action of `model` for the given features.
pub fn greedy_action<M: RLModel, A: RLAction>(model: &M, features: &[f32]) -> RLResult<A> {
    let prediction = model.predict(features)?;
    if prediction.len() != A::SIZE as usize {
        return Err(RLError::ActionSizeMismatch {
            expected: A::SIZE as usize,
            received: prediction.len(),
        });
    }
    let index = arg_max(&prediction).ok_or(RLError::ActionSizeMismatch {
        expected: A::SIZE as usize,
        received: 0,
    })?;
    Ok(A::from(index as u32))
}

/// Epsilon-greedy deep Q-learning agent with experience replay.
pub struct DQNAgent<S: RLState, A: RLAction, M: RLModel> {
    model: M,
    memory: ReplayBuffer<S, A>,
    gamma: f32,
    exploration_rate: f32,
    min_exploration_rate: f32,
    lr_scheduler: LearningRateScheduler,
    rng: XorShiftRng,
}

impl<S: RLState, A: RLAction, M: RLModel> DQNAgent<S, A, M> {
    pub fn new(model: M, config: AgentConfig, lr_scheduler: LearningRateScheduler) -> Self {
        let min_exploration_rate = config.min_exploration_rate.clamp(0.0, 1.0);
        Self {
            model,
            memory: ReplayBuffer::new(config.memory_size),
            gamma: config.gamma,
            exploration_rate: config.exploration_rate.clamp(min_exploration_rate, 1.0),
            min_exploration_rate,
            lr_scheduler,
            rng: XorShiftRng::seed_from_u64(config.seed),
        }
    }

    pub fn choose_action(&mut self, state: &S) -> RLResult<A> {
        if self.rng.gen::<f32>() < self.exploration_rate {
            return Ok(A::from(self.rng.gen_range(0..A::SIZE)));
        }
        greedy_action(&self.model, state.as_ref())
    }

    pub fn remember(&mut self, knowledge: Knowledge<S, A>) {
        self.memory.add(knowledge);
    }

    /// Trains the model on one sampled batch. `None` when the memory holds fewer than
    /// `batch_size` transitions, in which case nothing is changed.
    pub fn replay(&mut self, batch_size: usize) -> RLResult<Option<f32>> {
        let Some(batch) = self.memory.get(batch_size, &mut self.rng) else {
            return Ok(None);
        };
        let model = &self.model;
        let gamma = self.gamma;
        let rows = batch
            .par_iter()
            .map(|knowledge| Self::training_row(model, gamma, knowledge))
            .collect::<RLResult<Vec<_>>>()?;
        let (observations, targets): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        let lr = self.lr_scheduler.step();
        let loss = self.model.optimize(&observations, &targets, lr)?;
        debug!(loss, lr, batch_size, "replay");
        Ok(Some(loss))
    }

    // current prediction with the taken action's slot replaced by the bellman target
    fn training_row(
        model: &M,
        gamma: f32,
        knowledge: &Knowledge<S, A>,
    ) -> RLResult<(Vec<f32>, Vec<f32>)> {
        let observation = knowledge.pre_state().as_ref().to_vec();
        let mut target = model.predict(&observation)?;
        let value = match knowledge.post_state() {
            Some(post_state) if post_state.is_alive() => {
                let next_q = model
                    .predict(post_state.as_ref())?
                    .into_iter()
                    .fold(f32::NEG_INFINITY, f32::max);
                knowledge.reward() + gamma * next_q
            }
            _ => knowledge.reward(),
        };
        let action = knowledge.action().index();
        let slot = target.get_mut(action).ok_or(RLError::ActionOutOfRange {
            value: action as u32,
            max: A::SIZE.saturating_sub(1),
        })?;
        *slot = value;
        Ok((observation, target))
    }

    pub fn exploration_rate(&self) -> f32 {
        self.exploration_rate
    }

    pub fn min_exploration_rate(&self) -> f32 {
        self.min_exploration_rate
    }

    pub fn set_exploration_rate(&mut self, rate: f32) {
        self.exploration_rate = rate.clamp(self.min_exploration_rate, 1.0);
    }

    pub fn learning_rate(&self) -> f32 {
        self.lr_scheduler.current()
    }

    pub fn memory(&self) -> &ReplayBuffer<S, A> {
        &self.memory
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn save_model(&self, path: &Path) -> RLResult<()> {
        self.model.save_model(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::machine_learning::reinforcement_learning::{
        environment::test_support::{TestAction, TestState},
        rl_model::ModelShape,
    };

    use super::*;

    // Predicts the first two features as the q values of the two actions.
    struct MockModel {
        fits: usize,
        last_targets: Vec<Vec<f32>>,
    }

    impl RLModel for MockModel {
        fn init(_path: Option<&Path>, _shape: &ModelShape, _seed: u64) -> RLResult<Self> {
            Ok(Self {
                fits: 0,
                last_targets: Vec::new(),
            })
        }

        fn save_model(&self, _path: &Path) -> RLResult<()> {
            Ok(())
        }

        fn predict(&self, observation: &[f32]) -> RLResult<Vec<f32>> {
            Ok(observation[..2].to_vec())
        }

        fn optimize(
            &mut self,
            _observations: &[Vec<f32>],
            targets: &[Vec<f32>],
            _lr: f32,
        ) -> RLResult<f32> {
            self.fits += 1;
            self.last_targets = targets.to_vec();
            Ok(0.5)
        }
    }

    fn agent(exploration_rate: f32) -> DQNAgent<TestState, TestAction, MockModel> {
        let shape = ModelShape {
            feature_size: 2,
            action_size: 2,
            hidden_layers: vec![],
        };
        let config = AgentConfig {
            gamma: 0.9,
            exploration_rate,
            min_exploration_rate: 0.0,
            memory_size: 10,
            seed: 1,
        };
        DQNAgent::new(
            MockModel::init(None, &shape, 0).unwrap(),
            config,
            LearningRateScheduler::default(),
        )
    }

    fn alive(features: Vec<f32>) -> TestState {
        TestState::new(features, true)
    }

    #[test]
    fn test_arg_max_prefers_lowest_index() {
        assert_eq!(arg_max(&[0.5, 0.5]), Some(0));
        assert_eq!(arg_max(&[0.1, 0.7, 0.7]), Some(1));
        assert_eq!(arg_max(&[]), None);
    }

    #[test]
    fn test_greedy_choice() {
        let mut agent = agent(0.0);
        let action = agent.choose_action(&alive(vec![0.2, 0.8])).unwrap();
        assert_eq!(action, TestAction::Jump);
        let action = agent.choose_action(&alive(vec![0.5, 0.5])).unwrap();
        assert_eq!(action, TestAction::Stay);
    }

    #[test]
    fn test_full_exploration_tries_every_action() {
        let mut agent = agent(1.0);
        let state = alive(vec![1.0, 0.0]);
        let actions = (0..100)
            .map(|_| agent.choose_action(&state).unwrap())
            .collect::<Vec<_>>();
        assert!(actions.contains(&TestAction::Stay));
        assert!(actions.contains(&TestAction::Jump));
    }

    #[test]
    fn test_replay_underrun_is_noop() {
        let mut agent = agent(0.0);
        agent.remember(Knowledge::new(
            alive(vec![0.3, 0.4]),
            TestAction::Jump,
            1.0,
            None,
        ));
        assert_eq!(agent.replay(2).unwrap(), None);
        assert_eq!(agent.model().fits, 0);
    }

    #[test]
    fn test_terminal_target_is_reward() {
        let mut agent = agent(0.0);
        agent.remember(Knowledge::new(
            alive(vec![0.3, 0.4]),
            TestAction::Jump,
            -1.0,
            None,
        ));
        assert_eq!(agent.replay(1).unwrap(), Some(0.5));
        assert_eq!(agent.model().last_targets, vec![vec![0.3, -1.0]]);
    }

    #[test]
    fn test_dead_post_state_target_is_reward() {
        let mut agent = agent(0.0);
        agent.remember(Knowledge::new(
            alive(vec![0.3, 0.4]),
            TestAction::Stay,
            -1.0,
            Some(TestState::new(vec![5.0, 5.0], false)),
        ));
        agent.replay(1).unwrap();
        assert_eq!(agent.model().last_targets, vec![vec![-1.0, 0.4]]);
    }

    #[test]
    fn test_bellman_target_only_touches_taken_action() {
        let mut agent = agent(0.0);
        agent.remember(Knowledge::new(
            alive(vec![0.3, 0.4]),
            TestAction::Stay,
            1.0,
            Some(alive(vec![0.2, 0.6])),
        ));
        agent.replay(1).unwrap();
        let targets = &agent.model().last_targets;
        assert!((targets[0][0] - 1.54).abs() < 1e-6);
        assert_eq!(targets[0][1], 0.4);
    }

    #[test]
    fn test_exploration_rate_is_clamped() {
        let shape = ModelShape {
            feature_size: 2,
            action_size: 2,
            hidden_layers: vec![],
        };
        let config = AgentConfig {
            min_exploration_rate: 0.1,
            ..AgentConfig::default()
        };
        let mut agent: DQNAgent<TestState, TestAction, MockModel> = DQNAgent::new(
            MockModel::init(None, &shape, 0).unwrap(),
            config,
            LearningRateScheduler::default(),
        );
        agent.set_exploration_rate(0.01);
        assert_eq!(agent.exploration_rate(), 0.1);
        agent.set_exploration_rate(3.0);
        assert_eq!(agent.exploration_rate(), 1.0);
    }

    #[test]
    fn test_learning_rate_warmup_and_decay() {
        let mut scheduler = LearningRateScheduler::new(0.1, 0.5, 4, 2);
        assert!((scheduler.step() - 0.05).abs() < 1e-6);
        assert!((scheduler.step() - 0.1).abs() < 1e-6);
        assert!((scheduler.step() - 0.1).abs() < 1e-6);
        assert!((scheduler.step() - 0.05).abs() < 1e-6);
        assert!((scheduler.current() - 0.05).abs() < 1e-6);
    }
}
