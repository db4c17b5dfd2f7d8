//! Surety RPC - application boundary
//!
//! Wires the ledger, engines, settlement and event distribution into one
//! `AppContext`, and provides the oracle simulator and CLI commands.

pub mod commands;
pub mod context;
pub mod error;
pub mod simulator;

pub use context::{AppContext, Engines};
pub use error::{ErrorKind, SuretyError};
pub use simulator::{Answer, OracleAgent, OracleSimulator};
