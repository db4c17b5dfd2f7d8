//! Surety Ledger - authoritative state store
//!
//! Owns no behaviour beyond enforcing invariants on mutation. Engines
//! receive a `LedgerStore` explicitly and mutate it inside `atomically`.
//!
//! # Key Types
//! - `LedgerStore`: State store trait (airlines, flights, policies, oracles, balances)
//! - `InMemoryLedger`: The in-memory implementation
//! - `Capability` / `authorize`: Typed authorization checks per operation

pub mod access;
pub mod entity;
pub mod error;
pub mod memory;
pub mod store;

pub use access::{authorize, AccessDenied, Capability, Grant};
pub use entity::{
    Airline, Flight, InsurancePolicy, Oracle, OracleRequest, OracleRequestKey, PendingAdmission,
    ReconciliationRecord,
};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use store::{atomically, LedgerStore};
