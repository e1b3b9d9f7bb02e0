// reinforcement_learning.rs
pub mod environment;
pub mod q_learning;
pub mod replay_buffer;
pub mod rl_error;
pub mod rl_model;
