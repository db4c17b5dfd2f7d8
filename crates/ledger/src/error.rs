//! Ledger errors

use surety_core::{FlightKey, Principal};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Airline not found: {0}")]
    AirlineNotFound(Principal),

    #[error("Airline already exists: {0}")]
    AirlineExists(Principal),

    #[error("Flight not found: {0}")]
    FlightNotFound(FlightKey),

    #[error("Flight already exists: {0}")]
    FlightExists(FlightKey),

    #[error("Oracle not found: {0}")]
    OracleNotFound(Principal),

    #[error("Oracle already exists: {0}")]
    OracleExists(Principal),

    #[error("Oracle request not found: index {index} for {flight}")]
    RequestNotFound { index: u8, flight: FlightKey },

    #[error("Amount overflow on {account}")]
    Overflow { account: String },
}
