//! Policy engine errors

use surety_core::{Amount, FlightKey, FlightStatus};
use surety_ledger::{AccessDenied, LedgerError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unauthorized: {0}")]
    Unauthorized(AccessDenied),

    #[error("Invalid buyer: {0}")]
    InvalidBuyer(AccessDenied),

    #[error("Premium exceeded: {requested} requested, {already_paid} paid, maximum {maximum}")]
    PremiumExceeded {
        requested: Amount,
        already_paid: Amount,
        maximum: Amount,
    },

    #[error("Premium must be greater than zero")]
    ZeroPremium,

    #[error("Flight {flight} is already finalized as {status}")]
    FlightFinalized { flight: FlightKey, status: FlightStatus },

    #[error("Payout overflow for premium {0}")]
    PayoutOverflow(Amount),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
