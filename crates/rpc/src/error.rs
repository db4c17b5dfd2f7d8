//! Application-level errors
//!
//! Every engine error funnels into [`SuretyError`]. Callers that only care
//! about the category (as an RPC layer would) use [`SuretyError::kind`].

use strum_macros::Display;
use surety_events::EventError;
use surety_governance::GovernanceError;
use surety_ledger::{AccessDenied, LedgerError};
use surety_oracle::OracleError;
use surety_policy::PolicyError;
use surety_settlement::SettlementError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuretyError {
    #[error("Contract is not operational")]
    NotOperational,

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    NotOperational,
    Unauthorized,
    InvalidBuyer,
    PremiumExceeded,
    InsufficientFee,
    InsufficientBalance,
    InvalidInput,
    NotFound,
    AlreadyRegistered,
    ReconciliationFailure,
    Internal,
}

impl SuretyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SuretyError::NotOperational => ErrorKind::NotOperational,
            SuretyError::Unauthorized(_) => ErrorKind::Unauthorized,
            SuretyError::Governance(e) => match e {
                GovernanceError::Unauthorized(_) => ErrorKind::Unauthorized,
                GovernanceError::InsufficientFee { .. } => ErrorKind::InsufficientFee,
                GovernanceError::Ledger(e) => ledger_kind(e),
            },
            SuretyError::Policy(e) => match e {
                PolicyError::Unauthorized(_) => ErrorKind::Unauthorized,
                PolicyError::InvalidBuyer(_) => ErrorKind::InvalidBuyer,
                PolicyError::PremiumExceeded { .. } => ErrorKind::PremiumExceeded,
                PolicyError::ZeroPremium | PolicyError::FlightFinalized { .. } => {
                    ErrorKind::InvalidInput
                }
                PolicyError::PayoutOverflow(_) => ErrorKind::Internal,
                PolicyError::Ledger(e) => ledger_kind(e),
            },
            SuretyError::Oracle(e) => match e {
                OracleError::Unauthorized(_) => ErrorKind::Unauthorized,
                OracleError::InsufficientFee { .. } => ErrorKind::InsufficientFee,
                OracleError::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
                OracleError::InvalidIndexes { .. } => ErrorKind::InvalidInput,
                OracleError::Policy(_) => ErrorKind::Internal,
                OracleError::Ledger(e) => ledger_kind(e),
            },
            SuretyError::Settlement(e) => match e {
                SettlementError::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
                SettlementError::ReconciliationFailure { .. } => ErrorKind::ReconciliationFailure,
                SettlementError::Ledger(e) => ledger_kind(e),
            },
            SuretyError::Ledger(e) => ledger_kind(e),
            SuretyError::Event(_) => ErrorKind::Internal,
        }
    }
}

fn ledger_kind(error: &LedgerError) -> ErrorKind {
    match error {
        LedgerError::AirlineNotFound(_)
        | LedgerError::FlightNotFound(_)
        | LedgerError::OracleNotFound(_)
        | LedgerError::RequestNotFound { .. } => ErrorKind::NotFound,
        LedgerError::AirlineExists(_)
        | LedgerError::FlightExists(_)
        | LedgerError::OracleExists(_) => ErrorKind::AlreadyRegistered,
        LedgerError::Overflow { .. } => ErrorKind::Internal,
    }
}
