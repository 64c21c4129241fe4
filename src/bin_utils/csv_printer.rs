use std::io::Write;

use crate::{bank::CardNumber, command::Amount};
use csv::Writer;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountBalance {
    pub card: CardNumber,
    pub account: String,
    pub balance: Amount,
}

pub fn print_balances<W>(
    output: &mut W,
    balances: impl Iterator<Item = AccountBalance>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for balance in balances {
        if let Err(err) = writer.serialize(balance) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
