//! Governance errors

use surety_core::Amount;
use surety_ledger::{AccessDenied, LedgerError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    #[error("Participation fee too low: required {required}, offered {offered}")]
    InsufficientFee { required: Amount, offered: Amount },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
