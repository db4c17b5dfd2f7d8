//! # Surety Governance
//!
//! Decides which airlines join the trusted set.
//!
//! ## Rules
//! - While fewer than `bootstrap_airlines` (4) are registered, any active
//!   airline admits a candidate on its own
//! - Afterwards a candidate needs votes from ceil(registered / 2) distinct
//!   active airlines
//! - Airlines become active once they fund the participation fee (10)

mod engine;
mod error;

pub use engine::{AdmissionOutcome, FundingOutcome, GovernanceEngine};
pub use error::GovernanceError;
