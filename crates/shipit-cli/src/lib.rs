//! CLI argument models and validation for the shipit deploy bot binary.
//!
//! Exposes the clap-backed `Cli` plus helpers that validate flag combinations
//! and turn them into a Slack runtime configuration.

pub mod cli_args;
pub mod cli_types;
pub mod validation;

pub use cli_args::Cli;
pub use cli_types::*;
pub use validation::*;
