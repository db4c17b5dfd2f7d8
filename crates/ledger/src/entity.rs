//! Ledger entities
//!
//! Plain records. Invariants that span records (one vote per voter,
//! one payout per policy, non-negative balances) are enforced by the
//! store and the engines that mutate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use surety_core::{Amount, FlightKey, FlightStatus, Principal};

/// A member of the airline set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub id: Principal,
    pub name: String,
    pub registered: bool,
    /// Set once cumulative funding reaches the participation fee
    pub active: bool,
    /// Participation fees plus premiums sold on this airline's flights
    pub funds_contributed: Amount,
}

impl Airline {
    /// A freshly admitted airline: registered, not yet active, unfunded
    pub fn admitted(id: Principal, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            registered: true,
            active: false,
            funds_contributed: Amount::ZERO,
        }
    }
}

/// Votes collected for a candidate airline that is not yet admitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdmission {
    pub candidate: Principal,
    pub name: String,
    pub voters: BTreeSet<Principal>,
}

impl PendingAdmission {
    pub fn new(candidate: Principal, name: impl Into<String>) -> Self {
        Self {
            candidate,
            name: name.into(),
            voters: BTreeSet::new(),
        }
    }

    /// Record a vote (returns false if this voter already voted)
    pub fn add_vote(&mut self, voter: Principal) -> bool {
        self.voters.insert(voter)
    }

    pub fn votes(&self) -> usize {
        self.voters.len()
    }

    pub fn has_voted(&self, voter: &Principal) -> bool {
        self.voters.contains(voter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub status: FlightStatus,
    pub registered: bool,
}

impl Flight {
    pub fn scheduled(key: FlightKey) -> Self {
        Self {
            key,
            status: FlightStatus::Unknown,
            registered: true,
        }
    }
}

/// Insurance bought by one passenger on one flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub flight: FlightKey,
    pub passenger: Principal,
    pub premium_paid: Amount,
    pub payout_credited: bool,
}

impl InsurancePolicy {
    pub fn new(flight: FlightKey, passenger: Principal) -> Self {
        Self {
            flight,
            passenger,
            premium_paid: Amount::ZERO,
            payout_credited: false,
        }
    }
}

/// A registered oracle and the indexes it may answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub id: Principal,
    pub indexes: Vec<u8>,
    pub registered: bool,
    pub fee_paid: Amount,
}

impl Oracle {
    pub fn holds_index(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

/// Key of an oracle request: one request per (index, flight)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OracleRequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl OracleRequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

/// Responses collected for one status request
///
/// State machine: Open (`resolved == None`) -> Resolved. There is no
/// cancelled state; an open request stays open until quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub key: OracleRequestKey,
    pub requester: Principal,
    pub opened_at: DateTime<Utc>,
    /// Latest status reported by each oracle
    pub responses: BTreeMap<Principal, FlightStatus>,
    pub resolved: Option<FlightStatus>,
}

impl OracleRequest {
    pub fn open(key: OracleRequestKey, requester: Principal) -> Self {
        Self {
            key,
            requester,
            opened_at: Utc::now(),
            responses: BTreeMap::new(),
            resolved: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolved.is_none()
    }

    /// Record or overwrite an oracle's vote, returning the number of
    /// distinct oracles now backing `status`
    pub fn record(&mut self, oracle: Principal, status: FlightStatus) -> usize {
        self.responses.insert(oracle, status);
        self.votes_for(status)
    }

    pub fn votes_for(&self, status: FlightStatus) -> usize {
        self.responses.values().filter(|s| **s == status).count()
    }
}

/// A withdrawal whose balance was zeroed but whose transfer failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub passenger: Principal,
    pub amount: Amount,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> FlightKey {
        FlightKey::new(Principal::from("A1"), "ND1309", 1624103191959)
    }

    #[test]
    fn test_pending_admission_single_vote_per_voter() {
        let mut pending = PendingAdmission::new(Principal::from("A5"), "Airline 5");
        assert!(pending.add_vote(Principal::from("A1")));
        assert!(!pending.add_vote(Principal::from("A1")));
        assert!(pending.add_vote(Principal::from("A2")));
        assert_eq!(pending.votes(), 2);
        assert!(pending.has_voted(&Principal::from("A2")));
    }

    #[test]
    fn test_request_overwrites_oracle_vote() {
        let mut request = OracleRequest::open(
            OracleRequestKey::new(1, flight()),
            Principal::from("P1"),
        );
        assert_eq!(request.record(Principal::from("O1"), FlightStatus::OnTime), 1);
        assert_eq!(request.record(Principal::from("O1"), FlightStatus::LateAirline), 1);
        assert_eq!(request.votes_for(FlightStatus::OnTime), 0);
        assert_eq!(request.responses.len(), 1);
        assert!(request.is_open());
    }

    #[test]
    fn test_admitted_airline_is_inactive() {
        let airline = Airline::admitted(Principal::from("A1"), "Airline 1");
        assert!(airline.registered);
        assert!(!airline.active);
        assert!(airline.funds_contributed.is_zero());
    }
}
