//! Command-line client for a running nomen gateway.

pub mod cli;

pub use cli::run_cli;
