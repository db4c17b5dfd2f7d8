//! Surety Core - Domain types
//!
//! Fundamental types shared by every Surety crate:
//! - `Amount`: Non-negative fixed-point monetary value
//! - `Principal`: Opaque caller identity
//! - `FlightKey` / `FlightStatus`: Flight identity and oracle status codes
//! - `SuretyEvent`: Observable domain events
//! - `SuretyConfig`: Fees, thresholds and quorum sizes

pub mod amount;
pub mod config;
pub mod event;
pub mod flight;
pub mod principal;

pub use amount::{Amount, AmountError, AMOUNT_SCALE};
pub use config::{GovernanceConfig, OracleConfig, PolicyConfig, SuretyConfig};
pub use event::SuretyEvent;
pub use flight::{FlightKey, FlightStatus, FlightStatusError};
pub use principal::Principal;
