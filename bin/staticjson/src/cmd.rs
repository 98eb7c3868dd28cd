//! Command implementations.

pub mod check;
pub mod generate;
pub mod watch;
