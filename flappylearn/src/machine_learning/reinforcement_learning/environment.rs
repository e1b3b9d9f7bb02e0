use std::fmt::Debug;

// environment.rs
pub type Reward = f32;

pub trait RLAction: Clone + Debug + Copy + PartialEq + From<u32> + Into<u32> + Sync + Send {
    const SIZE: u32;

    fn index(self) -> usize {
        let value: u32 = self.into();
        value as usize
    }
}

/// A snapshot of the environment as seen by the agent. The slice is the normalized feature
/// vector fed to the approximator.
pub trait RLState: Clone + Debug + AsRef<[f32]> + Sync + Send {
    fn is_alive(&self) -> bool;
}

/// One transition. A `None` post state marks a terminal transition.
#[derive(Clone, Debug)]
pub struct Knowledge<S: RLState, A: RLAction> {
    pre_state: S,
    action: A,
    reward: Reward,
    post_state: Option<S>,
}

impl<S: RLState, A: RLAction> Knowledge<S, A> {
    pub fn new(pre_state: S, action: A, reward: Reward, post_state: Option<S>) -> Self {
        Self {
            pre_state,
            action,
            reward,
            post_state,
        }
    }

    pub fn pre_state(&self) -> &S {
        &self.pre_state
    }

    pub fn action(&self) -> A {
        self.action
    }

    pub fn reward(&self) -> Reward {
        self.reward
    }

    pub fn post_state(&self) -> Option<&S> {
        self.post_state.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.post_state
            .as_ref()
            .map_or(true, |state| !state.is_alive())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{TestAction, TestState};
    use super::*;

    #[test]
    fn test_missing_post_state_is_terminal() {
        let knowledge = Knowledge::new(
            TestState::new(vec![0.0], true),
            TestAction::Jump,
            -1.0,
            None,
        );
        assert!(knowledge.is_terminal());
        assert!(knowledge.post_state().is_none());
    }

    #[test]
    fn test_dead_post_state_is_terminal() {
        let knowledge = Knowledge::new(
            TestState::new(vec![0.0], true),
            TestAction::Stay,
            -1.0,
            Some(TestState::new(vec![0.1], false)),
        );
        assert!(knowledge.is_terminal());
    }

    #[test]
    fn test_alive_post_state() {
        let knowledge = Knowledge::new(
            TestState::new(vec![0.0], true),
            TestAction::Stay,
            1.0,
            Some(TestState::new(vec![0.1], true)),
        );
        assert!(!knowledge.is_terminal());
        assert_eq!(knowledge.action().index(), 0);
        assert_eq!(knowledge.reward(), 1.0);
    }
}
