//! Settlement errors

use surety_core::{Amount, Principal};
use surety_ledger::LedgerError;
use thiserror::Error;

/// Failure reported by a `FundsTransfer` implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Transfer channel unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Insufficient balance for {0}")]
    InsufficientBalance(Principal),

    /// Balance was zeroed but the funds never left. Needs an operator.
    #[error("Reconciliation failure: {amount} owed to {passenger} ({reason})")]
    ReconciliationFailure {
        passenger: Principal,
        amount: Amount,
        reason: String,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
