//! CLI command implementations for kingsgrid.

pub(crate) mod generate;
pub(crate) mod run;
pub(crate) mod validate;
pub(crate) mod watch;

pub(crate) mod session;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

use kingsgrid::bot::Strategy;

/// Output format for `generate`, `run` and `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Bot behaviour selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BotStrategy {
    /// Random legal moves.
    Random,
    /// Captures first, then expansion.
    Greedy,
}

impl From<BotStrategy> for Strategy {
    fn from(strategy: BotStrategy) -> Self {
        match strategy {
            BotStrategy::Random => Self::Random,
            BotStrategy::Greedy => Self::Greedy,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

impl From<kingsgrid::MapError> for CliError {
    fn from(e: kingsgrid::MapError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<kingsgrid::GameError> for CliError {
    fn from(e: kingsgrid::GameError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<kingsgrid::ConfigError> for CliError {
    fn from(e: kingsgrid::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}
