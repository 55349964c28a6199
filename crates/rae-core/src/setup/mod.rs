//! Population Setup

pub mod agents;

pub use agents::*;
