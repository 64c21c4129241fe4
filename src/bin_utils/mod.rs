//! Bootstraps [`crate::session`] for the `atm-session` binary: loads a bank
//! from CSV, replays a session script against it and prints the balances.

use std::io::{Read, Write};

use crate::{
    bank::{Bank, in_memory_bank::BankRegistry},
    session::{SessionController, SessionError},
};
use anyhow::{Context, Result};
use csv_parser::{CsvSessionParser, SessionStep, load_bank};
use csv_printer::{AccountBalance, print_balances};
use tracing::info;

pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, S, W: 'w> {
    pub bank_input: R,
    pub session_input: S,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, SessionError)>,
}

impl<'w, R, S, W> Service<'w, R, S, W>
where
    R: Read,
    S: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let bank = load_bank(self.bank_input).context("Failed to load bank directory")?;
        info!(cards = bank.len(), "bank directory loaded");

        let mut session = SessionController::new(&bank);
        for row in CsvSessionParser::new(self.session_input)? {
            let (line, step) = row?;
            if let Err(err) = apply_step(&mut session, step) {
                (self.error_printer)(line, err);
            }
        }
        session.remove_card();

        print_balances(self.output, balances(&bank))
    }
}

fn apply_step<B: Bank + ?Sized>(
    session: &mut SessionController<'_, B>,
    step: SessionStep,
) -> Result<(), SessionError> {
    match step {
        SessionStep::InsertCard(card) => session.insert_card(card),
        SessionStep::RemoveCard => {
            session.remove_card();
            Ok(())
        }
        SessionStep::EnterPin(pin) => session.enter_pin(&pin),
        SessionStep::SelectAccount(account) => session.select_account(&account),
        SessionStep::SeeBalance => {
            let balance = session.see_balance()?;
            info!(balance, "balance inquiry");
            Ok(())
        }
        SessionStep::Withdraw(amount) => {
            let dispensed = session.withdraw(amount)?;
            info!(dispensed, "cash dispensed");
            Ok(())
        }
        SessionStep::Deposit(amount) => session.deposit(amount).map(|_| ()),
    }
}

fn balances(bank: &BankRegistry) -> impl Iterator<Item = AccountBalance> {
    bank.cards().flat_map(|(card, dir)| {
        dir.balances()
            .into_iter()
            .map(move |(account, balance)| AccountBalance {
                card,
                account,
                balance,
            })
    })
}
