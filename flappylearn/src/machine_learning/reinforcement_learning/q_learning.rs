pub mod dqnet;
