//! ECS Components
//!
//! Entity components for agents.

pub mod agent;

pub use agent::*;
