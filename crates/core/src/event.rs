//! Domain events emitted by committed operations
//!
//! Oracle agents consume `OracleRequested`; UI layers and the journal
//! consume everything. The core does not know who listens.

use serde::{Deserialize, Serialize};

use crate::{Amount, FlightKey, FlightStatus, Principal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuretyEvent {
    AirlineRegistered {
        airline: Principal,
        name: String,
        votes: usize,
    },

    AirlineVoteRecorded {
        candidate: Principal,
        voter: Principal,
        votes: usize,
        required: usize,
    },

    AirlineFunded {
        airline: Principal,
        amount: Amount,
        total: Amount,
        active: bool,
    },

    FlightRegistered {
        flight: FlightKey,
    },

    InsurancePurchased {
        flight: FlightKey,
        passenger: Principal,
        premium: Amount,
        total_premium: Amount,
    },

    OracleRegistered {
        oracle: Principal,
        indexes: Vec<u8>,
    },

    /// An oracle request was opened; oracles holding `index` should answer
    OracleRequested {
        index: u8,
        flight: FlightKey,
    },

    OracleReported {
        index: u8,
        flight: FlightKey,
        oracle: Principal,
        status: FlightStatus,
    },

    FlightStatusResolved {
        flight: FlightKey,
        status: FlightStatus,
    },

    PayoutCredited {
        flight: FlightKey,
        passenger: Principal,
        amount: Amount,
    },

    BalanceWithdrawn {
        passenger: Principal,
        amount: Amount,
    },

    /// A balance was zeroed but the outbound transfer failed
    ReconciliationFailed {
        passenger: Principal,
        amount: Amount,
        reason: String,
    },

    OperationalStatusChanged {
        operational: bool,
    },
}

impl SuretyEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SuretyEvent::AirlineRegistered { .. } => "airline_registered",
            SuretyEvent::AirlineVoteRecorded { .. } => "airline_vote_recorded",
            SuretyEvent::AirlineFunded { .. } => "airline_funded",
            SuretyEvent::FlightRegistered { .. } => "flight_registered",
            SuretyEvent::InsurancePurchased { .. } => "insurance_purchased",
            SuretyEvent::OracleRegistered { .. } => "oracle_registered",
            SuretyEvent::OracleRequested { .. } => "oracle_requested",
            SuretyEvent::OracleReported { .. } => "oracle_reported",
            SuretyEvent::FlightStatusResolved { .. } => "flight_status_resolved",
            SuretyEvent::PayoutCredited { .. } => "payout_credited",
            SuretyEvent::BalanceWithdrawn { .. } => "balance_withdrawn",
            SuretyEvent::ReconciliationFailed { .. } => "reconciliation_failed",
            SuretyEvent::OperationalStatusChanged { .. } => "operational_status_changed",
        }
    }
}
