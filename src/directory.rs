use std::collections::{BTreeMap, btree_map::Entry};

use parking_lot::Mutex;
use thiserror::Error;

use crate::command::{Amount, TransactionAction, TransactionCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountEvent {
    pub amount: Amount,
    pub kind: AccountEventKind,
    pub balance_after: Amount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account `{0}` does not exist")]
    NoSuchAccount(String),
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },
    #[error("Depositing {amount} would overflow balance {balance}")]
    BalanceOverflow { amount: Amount, balance: Amount },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Account `{0}` is listed more than once")]
    DuplicateAccount(String),
    #[error("Account `{account}` cannot open with negative balance {balance}")]
    NegativeBalance { account: String, balance: Amount },
}

#[derive(Debug, Default)]
struct Account {
    balance: Amount,
}

impl Account {
    fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited => {
                self.balance += event.amount;
            }
            AccountEventKind::Withdrawn => {
                self.balance -= event.amount;
            }
        }
    }

    fn handle_transaction(&self, command: TransactionCommand) -> Result<AccountEvent, AccountError> {
        match command.action {
            TransactionAction::Deposit => {
                let balance_after = self.balance.checked_add(command.amount).ok_or(
                    AccountError::BalanceOverflow {
                        amount: command.amount,
                        balance: self.balance,
                    },
                )?;
                Ok(AccountEvent {
                    amount: command.amount,
                    kind: AccountEventKind::Deposited,
                    balance_after,
                })
            }
            TransactionAction::Withdraw => {
                if self.balance >= command.amount {
                    Ok(AccountEvent {
                        amount: command.amount,
                        kind: AccountEventKind::Withdrawn,
                        balance_after: self.balance - command.amount,
                    })
                } else {
                    Err(AccountError::InsufficientFunds {
                        requested: command.amount,
                        available: self.balance,
                    })
                }
            }
        }
    }
}

/// Named accounts reachable with one card, guarded by a single PIN.
///
/// Balances sit behind a lock so that a check-and-debit is atomic even when
/// several sessions hold the same directory.
#[derive(Debug)]
pub struct AccountDirectory {
    pin: String,
    accounts: Mutex<BTreeMap<String, Account>>,
}

impl AccountDirectory {
    pub fn new<I, S>(pin: impl Into<String>, accounts: I) -> Result<Self, DirectoryError>
    where
        I: IntoIterator<Item = (S, Amount)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, balance) in accounts {
            let name = name.into();
            if balance < 0 {
                return Err(DirectoryError::NegativeBalance {
                    account: name,
                    balance,
                });
            }
            match map.entry(name) {
                Entry::Occupied(entry) => {
                    return Err(DirectoryError::DuplicateAccount(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(Account { balance });
                }
            }
        }
        Ok(Self {
            pin: pin.into(),
            accounts: Mutex::new(map),
        })
    }

    pub fn pin_matches(&self, pin: &str) -> bool {
        self.pin == pin
    }

    pub fn contains(&self, account: &str) -> bool {
        self.accounts.lock().contains_key(account)
    }

    pub fn balance(&self, account: &str) -> Option<Amount> {
        self.accounts.lock().get(account).map(|acc| acc.balance)
    }

    /// Snapshot of every account and its balance, ordered by name.
    pub fn balances(&self) -> Vec<(String, Amount)> {
        self.accounts
            .lock()
            .iter()
            .map(|(name, acc)| (name.clone(), acc.balance))
            .collect()
    }

    /// Validates and commits a transaction while holding the lock, so a
    /// rejected command never touches the balance.
    pub fn execute(
        &self,
        account: &str,
        command: TransactionCommand,
    ) -> Result<AccountEvent, AccountError> {
        let mut accounts = self.accounts.lock();
        let acc = accounts
            .get_mut(account)
            .ok_or_else(|| AccountError::NoSuchAccount(account.to_owned()))?;
        let evt = acc.handle_transaction(command)?;
        acc.apply(&evt);
        Ok(evt)
    }
}
