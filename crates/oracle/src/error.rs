//! Oracle coordinator errors

use surety_core::{Amount, Principal};
use surety_ledger::{AccessDenied, LedgerError};
use surety_policy::PolicyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    /// Registration fee below the configured minimum
    #[error("Insufficient registration fee: required {required}, offered {offered}")]
    InsufficientFee { required: Amount, offered: Amount },

    #[error("Oracle already registered: {0}")]
    AlreadyRegistered(Principal),

    #[error("Invalid index set: {reason}")]
    InvalidIndexes { reason: String },

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
