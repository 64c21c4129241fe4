use thiserror::Error;

use crate::directory::AccountDirectory;

pub mod in_memory_bank;

pub type CardNumber = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Card {0} does not exist in bank database")]
    NoSuchCard(CardNumber),
    #[error("PIN entered is not correct")]
    WrongPin,
}

/// Card lookup and credential check, the only bank capabilities a session needs.
pub trait Bank {
    fn card_exists(&self, card: CardNumber) -> bool;

    /// On success returns the card's directory. The reference lives as long
    /// as the bank itself, so sessions may hold on to it across calls.
    fn check_pin(&self, card: CardNumber, pin: &str) -> Result<&AccountDirectory, AuthError>;
}
