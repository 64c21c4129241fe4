use std::fs::File;

use anyhow::{Context, Result};
use atm_session::bin_utils::Service;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atm_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let bank_file = args
        .next()
        .context("Expected a bank file name as the first argument")?;
    let session_file = args
        .next()
        .context("Expected a session file name as the second argument")?;
    let bank_input =
        File::open(&bank_file).with_context(|| format!("Failed to open `{bank_file}`"))?;
    let session_input =
        File::open(&session_file).with_context(|| format!("Failed to open `{session_file}`"))?;

    let service = Service {
        bank_input,
        session_input,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| eprintln!("Error at line {line}: {err}")),
    };
    service.run()
}
