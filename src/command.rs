use serde::Deserialize;
use thiserror::Error;

/// Whole currency units. Signed so that a caller passing a negative amount
/// can be rejected explicitly instead of wrapping.
pub type Amount = i64;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionAction {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionCommand {
    pub action: TransactionAction,
    pub amount: Amount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Amount must not be negative for {action:?}, got {amount}")]
    NegativeAmount {
        action: TransactionAction,
        amount: Amount,
    },
}

impl TransactionCommand {
    pub fn parse(action: TransactionAction, amount: Amount) -> Result<Self, CommandError> {
        if amount < 0 {
            return Err(CommandError::NegativeAmount { action, amount });
        }
        Ok(Self { action, amount })
    }

    pub fn withdraw(amount: Amount) -> Result<Self, CommandError> {
        Self::parse(TransactionAction::Withdraw, amount)
    }

    pub fn deposit(amount: Amount) -> Result<Self, CommandError> {
        Self::parse(TransactionAction::Deposit, amount)
    }
}
