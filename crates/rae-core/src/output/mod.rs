//! Output Generation

pub mod report;

pub use report::*;
