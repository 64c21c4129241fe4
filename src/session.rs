use thiserror::Error;
use tracing::{info, warn};

use crate::{
    bank::{AuthError, Bank, CardNumber, in_memory_bank::BankRegistry},
    command::{Amount, CommandError, TransactionAction, TransactionCommand},
    directory::{AccountDirectory, AccountError, AccountEvent},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    InvalidAmount(#[from] CommandError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("A card is already inserted, remove it first")]
    CardAlreadyInserted,
    #[error("A card must be inserted before entering the PIN")]
    CardRequired,
    #[error("PIN must be entered before accessing the accounts")]
    PinRequired,
    #[error("No account has been selected")]
    NoAccountSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionStage {
    NoCard,
    CardInserted,
    Authenticated,
    AccountSelected,
}

#[derive(Debug, Default)]
enum SessionState<'b> {
    #[default]
    NoCard,
    CardInserted {
        card: CardNumber,
    },
    Authenticated {
        card: CardNumber,
        directory: &'b AccountDirectory,
    },
    AccountSelected {
        card: CardNumber,
        directory: &'b AccountDirectory,
        account: String,
    },
}

/// One ATM session: card, then PIN, then account, then transactions.
///
/// Every operation checks its own precondition against the current state;
/// callers cannot skip a step by calling out of order.
pub struct SessionController<'b, B: ?Sized = BankRegistry> {
    bank: &'b B,
    state: SessionState<'b>,
}

impl<'b, B> SessionController<'b, B>
where
    B: Bank + ?Sized,
{
    pub fn new(bank: &'b B) -> Self {
        Self {
            bank,
            state: SessionState::NoCard,
        }
    }

    pub fn bank(&self) -> &'b B {
        self.bank
    }

    pub fn stage(&self) -> SessionStage {
        match self.state {
            SessionState::NoCard => SessionStage::NoCard,
            SessionState::CardInserted { .. } => SessionStage::CardInserted,
            SessionState::Authenticated { .. } => SessionStage::Authenticated,
            SessionState::AccountSelected { .. } => SessionStage::AccountSelected,
        }
    }

    pub fn card_number(&self) -> Option<CardNumber> {
        match self.state {
            SessionState::NoCard => None,
            SessionState::CardInserted { card }
            | SessionState::Authenticated { card, .. }
            | SessionState::AccountSelected { card, .. } => Some(card),
        }
    }

    pub fn selected_account(&self) -> Option<&str> {
        match &self.state {
            SessionState::AccountSelected { account, .. } => Some(account.as_str()),
            _ => None,
        }
    }

    pub fn insert_card(&mut self, card: CardNumber) -> Result<(), SessionError> {
        if let Some(current) = self.card_number() {
            warn!(card, current, "card rejected, another card is inserted");
            return Err(SessionError::CardAlreadyInserted);
        }
        if !self.bank.card_exists(card) {
            warn!(card, "card rejected, unknown to the bank");
            return Err(AuthError::NoSuchCard(card).into());
        }
        self.state = SessionState::CardInserted { card };
        info!(card, "card inserted");
        Ok(())
    }

    /// Clears the whole session. Returns the ejected card, or `None` when no
    /// card was inserted.
    pub fn remove_card(&mut self) -> Option<CardNumber> {
        let card = self.card_number();
        self.state = SessionState::NoCard;
        if let Some(card) = card {
            info!(card, "card removed");
        }
        card
    }

    /// Checks `pin` against the inserted card. May be repeated after a
    /// successful check; the outcome always replaces the previous one, and
    /// any selected account is dropped.
    pub fn enter_pin(&mut self, pin: &str) -> Result<(), SessionError> {
        let Some(card) = self.card_number() else {
            warn!("PIN entered without a card");
            return Err(SessionError::CardRequired);
        };
        let bank = self.bank;
        match bank.check_pin(card, pin) {
            Ok(directory) => {
                self.state = SessionState::Authenticated { card, directory };
                info!(card, "PIN accepted");
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::CardInserted { card };
                warn!(card, %err, "PIN rejected");
                Err(err.into())
            }
        }
    }

    /// Binds `account` for the following transactions. An unknown name
    /// leaves a previous selection in place.
    pub fn select_account(&mut self, account: &str) -> Result<(), SessionError> {
        let (card, directory) = match &self.state {
            SessionState::Authenticated { card, directory }
            | SessionState::AccountSelected {
                card, directory, ..
            } => (*card, *directory),
            SessionState::NoCard | SessionState::CardInserted { .. } => {
                warn!(account, "account selection before PIN");
                return Err(SessionError::PinRequired);
            }
        };
        let Some(balance) = directory.balance(account) else {
            warn!(card, account, "account does not exist");
            return Err(AccountError::NoSuchAccount(account.to_owned()).into());
        };
        self.state = SessionState::AccountSelected {
            card,
            directory,
            account: account.to_owned(),
        };
        info!(card, account, balance, "account selected");
        Ok(())
    }

    pub fn see_balance(&self) -> Result<Amount, SessionError> {
        let (_, directory, account) = self.selected()?;
        directory
            .balance(account)
            .ok_or_else(|| SessionError::from(AccountError::NoSuchAccount(account.to_owned())))
    }

    /// Returns the dispensed amount. On any error nothing is dispensed and
    /// the balance is unchanged.
    pub fn withdraw(&mut self, amount: Amount) -> Result<Amount, SessionError> {
        let evt = self.transact(TransactionAction::Withdraw, amount)?;
        Ok(evt.amount)
    }

    /// Returns the balance after the deposit.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, SessionError> {
        let evt = self.transact(TransactionAction::Deposit, amount)?;
        Ok(evt.balance_after)
    }

    fn selected(&self) -> Result<(CardNumber, &'b AccountDirectory, &str), SessionError> {
        match &self.state {
            SessionState::AccountSelected {
                card,
                directory,
                account,
            } => Ok((*card, *directory, account.as_str())),
            _ => {
                warn!(stage = ?self.stage(), "no account selected");
                Err(SessionError::NoAccountSelected)
            }
        }
    }

    fn transact(
        &self,
        action: TransactionAction,
        amount: Amount,
    ) -> Result<AccountEvent, SessionError> {
        let (card, directory, account) = self.selected()?;
        let command = TransactionCommand::parse(action, amount).inspect_err(|err| {
            warn!(card, account, %err, "transaction rejected");
        })?;
        match directory.execute(account, command) {
            Ok(evt) => {
                info!(
                    card,
                    account,
                    amount = evt.amount,
                    balance = evt.balance_after,
                    kind = ?evt.kind,
                    "transaction committed"
                );
                Ok(evt)
            }
            Err(err) => {
                warn!(card, account, %err, "transaction rejected");
                Err(err.into())
            }
        }
    }
}
