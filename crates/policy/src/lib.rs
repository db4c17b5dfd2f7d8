//! Surety Policy Engine
//!
//! Flight registration, insurance purchase, and payout crediting on a
//! finalized flight status. Premiums capitalize the airline's pool;
//! payouts land in the passenger's withdrawable balance.

mod engine;
mod error;

pub use engine::{PayoutSummary, PolicyEngine, PurchaseReceipt};
pub use error::PolicyError;
