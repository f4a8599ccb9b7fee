//! Library components of the rulesmith command line.

pub mod config;
pub mod logging;
