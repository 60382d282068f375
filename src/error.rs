//! Error types for the engine and its collaborators

use thiserror::Error;

use crate::sim::GamePhase;
use crate::stake::{Credits, Stake};

/// Why a run could not be started. No state is mutated when these are returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("insufficient funds for stake {stake} (balance {balance})")]
    InsufficientFunds { stake: Credits, balance: Credits },
    #[error("stake {0} is not on the stake ladder")]
    UnknownStake(Stake),
    #[error("cannot start from phase {0:?}")]
    InvalidPhase(GamePhase),
}

/// Wallet/ledger failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds (balance {balance}, requested {requested})")]
    InsufficientFunds { balance: Credits, requested: Credits },
}

/// Random source failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RngError {
    #[error("random source exhausted")]
    Exhausted,
    #[error("random source produced out-of-range sample {0}")]
    OutOfRange(String),
}

/// Configuration loading/validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Rejected command dispatched while the engine could not act on it
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Start(#[from] StartError),
    #[error("command {command} ignored in phase {phase:?}")]
    Ignored {
        command: &'static str,
        phase: GamePhase,
    },
}
