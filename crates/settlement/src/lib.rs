//! Surety Settlement
//!
//! Passengers pull their credited balances out of the system. The actual
//! value transfer is delegated to a `FundsTransfer` implementation.

mod error;
mod settlement;
mod transfer;

pub use error::{SettlementError, TransferError};
pub use settlement::Settlement;
pub use transfer::{FundsTransfer, RecordingTransfer, TransferReceipt};
