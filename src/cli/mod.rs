//! Command-line entry point.

pub mod args;
pub mod watch;

pub use args::Cli;
