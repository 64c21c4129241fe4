use std::{
    collections::{BTreeMap, btree_map::Entry},
    io::Read,
};

use anyhow::{Context, Result, bail};
use csv::{DeserializeRecordsIntoIter, Trim};
use serde::Deserialize;

use crate::{
    bank::{CardNumber, in_memory_bank::BankRegistry},
    command::Amount,
    directory::AccountDirectory,
};

#[derive(Debug, Deserialize)]
pub struct BankRecord {
    pub card: CardNumber,
    pub pin: String,
    pub account: String,
    pub balance: Amount,
}

/// Builds a registry from `card,pin,account,balance` rows. Rows sharing a card
/// number form one directory and must agree on the PIN.
pub fn load_bank<R: Read>(source: R) -> Result<BankRegistry> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(source);

    let mut cards: BTreeMap<CardNumber, (String, Vec<(String, Amount)>)> = BTreeMap::new();
    for row in reader.deserialize() {
        let record: BankRecord = row.context("Failed to parse bank record")?;
        match cards.entry(record.card) {
            Entry::Vacant(entry) => {
                entry.insert((record.pin, vec![(record.account, record.balance)]));
            }
            Entry::Occupied(mut entry) => {
                let (pin, accounts) = entry.get_mut();
                if *pin != record.pin {
                    bail!("Card {} is listed with conflicting PINs", record.card);
                }
                accounts.push((record.account, record.balance));
            }
        }
    }

    cards
        .into_iter()
        .map(|(card, (pin, accounts))| {
            AccountDirectory::new(pin, accounts)
                .map(|dir| (card, dir))
                .with_context(|| format!("Invalid accounts for card {card}"))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Insert,
    Remove,
    Pin,
    Select,
    Balance,
    Withdraw,
    Deposit,
}

#[derive(Debug, Deserialize)]
struct StepRecord {
    action: StepKind,
    value: Option<String>,
}

/// One client action at the ATM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    InsertCard(CardNumber),
    RemoveCard,
    EnterPin(String),
    SelectAccount(String),
    SeeBalance,
    Withdraw(Amount),
    Deposit(Amount),
}

impl SessionStep {
    fn from_record(record: StepRecord) -> Result<Self> {
        let kind = record.action;
        let value = record.value.filter(|v| !v.is_empty());
        let require = || value.clone().with_context(|| format!("{kind:?} requires a value"));
        Ok(match kind {
            StepKind::Insert => {
                let raw = require()?;
                Self::InsertCard(
                    raw.parse()
                        .with_context(|| format!("Invalid card number `{raw}`"))?,
                )
            }
            StepKind::Remove => Self::RemoveCard,
            StepKind::Pin => Self::EnterPin(require()?),
            StepKind::Select => Self::SelectAccount(require()?),
            StepKind::Balance => Self::SeeBalance,
            StepKind::Withdraw => Self::Withdraw(parse_amount(&require()?)?),
            StepKind::Deposit => Self::Deposit(parse_amount(&require()?)?),
        })
    }
}

fn parse_amount(raw: &str) -> Result<Amount> {
    raw.parse()
        .with_context(|| format!("Invalid amount `{raw}`"))
}

/// Parses a session script in `action,value` CSV format.
pub struct CsvSessionParser<R> {
    iter: DeserializeRecordsIntoIter<R, StepRecord>,
}

impl<R> CsvSessionParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);
        // read the header up front so record positions start at line 2
        reader
            .headers()
            .context("Failed to read session script header")?;

        Ok(Self {
            iter: reader.into_deserialize(),
        })
    }
}

impl<R> Iterator for CsvSessionParser<R>
where
    R: Read,
{
    type Item = Result<(u64, SessionStep)>;

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| {
            row.map_err(anyhow::Error::from)
                .and_then(SessionStep::from_record)
                .map(|step| (curr_line, step))
                .with_context(|| format!("Malformed session step at line {curr_line}"))
        })
    }
}
