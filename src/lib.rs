/// Leaf storage for one card: named accounts, their balances and the PIN.
/// Balance changes go through validated commands that produce events.
pub mod directory;

/// Withdraw/deposit requests, validated before they reach a directory.
pub mod command;

/// Bank interface used by sessions, plus the in-memory card registry.
pub mod bank;

/// ATM session state machine: card, PIN, account, transactions.
pub mod session;

/// CSV loading and replay helpers for the binary. Lives in the library so the
/// integration tests can drive it too.
pub mod bin_utils;
