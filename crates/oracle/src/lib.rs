//! Surety Oracle Coordinator
//!
//! Assigns indexes to oracles, opens flight status requests and resolves
//! them by quorum of distinct oracles. Resolution finalizes the flight and
//! hands off to the policy engine for payouts.
//!
//! # Key Types
//! - `OracleCoordinator`: Registration, requests and responses
//! - `IndexGenerator`: Pluggable source of indexes (`HashIndexGenerator`, `FixedIndexGenerator`)

mod coordinator;
mod error;
mod generator;

pub use coordinator::{FetchOutcome, OracleCoordinator, ResponseOutcome};
pub use error::OracleError;
pub use generator::{FixedIndexGenerator, HashIndexGenerator, IndexGenerator};
