//! Collaborator contracts for money and score persistence
//!
//! The engine debits the stake when a paid run starts and credits the prize
//! when the run settles. Score submission is fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::sim::prize::{Prize, PrizeKind};
use crate::stake::Credits;

pub trait Wallet {
    fn balance(&self) -> Credits;

    /// Take `amount` from the balance, or fail without changing it
    fn debit(&mut self, amount: Credits) -> Result<(), LedgerError>;

    /// Pay out a settled prize
    fn credit(&mut self, prize: Prize);
}

/// Final numbers of a run, as sent to score persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub run_id: u64,
    pub score: u64,
    pub blocks_stacked: u32,
    pub highest_row: u32,
}

pub trait ScoreSink {
    fn submit_score(&mut self, submission: ScoreSubmission, timestamp: f64);
}

/// Discards submissions
impl ScoreSink for () {
    fn submit_score(&mut self, _submission: ScoreSubmission, _timestamp: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntry {
    Debit(Credits),
    CreditCash(Credits),
    CreditPoints(u64),
}

/// In-memory wallet used by the headless runner and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryWallet {
    balance: Credits,
    points: u64,
    history: Vec<LedgerEntry>,
}

impl MemoryWallet {
    pub fn new(balance: Credits) -> Self {
        Self {
            balance,
            points: 0,
            history: Vec::new(),
        }
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn history(&self) -> &[LedgerEntry] {
        &self.history
    }
}

impl Wallet for MemoryWallet {
    fn balance(&self) -> Credits {
        self.balance
    }

    fn debit(&mut self, amount: Credits) -> Result<(), LedgerError> {
        let remaining =
            self.balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientFunds {
                    balance: self.balance,
                    requested: amount,
                })?;
        self.balance = remaining;
        self.history.push(LedgerEntry::Debit(amount));
        Ok(())
    }

    fn credit(&mut self, prize: Prize) {
        match prize.kind {
            PrizeKind::Cash => {
                let amount = Credits::from_cents(prize.amount);
                self.balance = self.balance.saturating_add(amount);
                self.history.push(LedgerEntry::CreditCash(amount));
            }
            PrizeKind::Points => {
                self.points = self.points.saturating_add(prize.amount);
                self.history.push(LedgerEntry::CreditPoints(prize.amount));
            }
        }
    }
}
