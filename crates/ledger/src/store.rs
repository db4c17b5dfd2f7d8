//! LedgerStore - the state store every engine is handed explicitly
//!
//! Engines never own state. Each operation receives `&mut impl LedgerStore`
//! and runs inside [`atomically`], so a failed operation leaves no trace.

use surety_core::{Amount, FlightKey, Principal, SuretyEvent};

use crate::entity::{
    Airline, Flight, InsurancePolicy, Oracle, OracleRequest, OracleRequestKey, PendingAdmission,
    ReconciliationRecord,
};
use crate::error::LedgerError;

/// Authoritative mapping of airlines, flights, policies, oracles and balances
pub trait LedgerStore {
    // === System ===

    /// Principal that constructed the system
    fn owner(&self) -> &Principal;

    fn is_operational(&self) -> bool;

    fn set_operational(&mut self, operational: bool);

    // === Airlines ===

    fn airline(&self, id: &Principal) -> Option<&Airline>;

    fn airline_mut(&mut self, id: &Principal) -> Option<&mut Airline>;

    /// Insert a new airline. Fails if the principal already exists.
    fn insert_airline(&mut self, airline: Airline) -> Result<(), LedgerError>;

    fn registered_airline_count(&self) -> usize;

    fn pending_admission(&self, candidate: &Principal) -> Option<&PendingAdmission>;

    /// Get or create the vote record for a candidate
    fn open_admission(&mut self, candidate: &Principal, name: &str) -> &mut PendingAdmission;

    /// Remove and return the vote record (consumed on admission)
    fn take_pending_admission(&mut self, candidate: &Principal) -> Option<PendingAdmission>;

    // === Flights & policies ===

    fn flight(&self, key: &FlightKey) -> Option<&Flight>;

    fn flight_mut(&mut self, key: &FlightKey) -> Option<&mut Flight>;

    fn insert_flight(&mut self, flight: Flight) -> Result<(), LedgerError>;

    fn policy(&self, flight: &FlightKey, passenger: &Principal) -> Option<&InsurancePolicy>;

    /// Get or create the policy of `passenger` on `flight`
    fn policy_entry(&mut self, flight: &FlightKey, passenger: &Principal) -> &mut InsurancePolicy;

    /// All policies on a flight, ordered by passenger
    fn flight_policies_mut(&mut self, flight: &FlightKey) -> Vec<&mut InsurancePolicy>;

    // === Balances ===

    /// Withdrawable balance (zero for unknown principals)
    fn get_balance(&self, principal: &Principal) -> Amount;

    /// Add to a balance, returning the new balance
    fn credit_balance(&mut self, principal: &Principal, amount: Amount)
        -> Result<Amount, LedgerError>;

    /// Zero a balance, returning what it held
    fn take_balance(&mut self, principal: &Principal) -> Amount;

    // === Oracles ===

    fn oracle(&self, id: &Principal) -> Option<&Oracle>;

    fn insert_oracle(&mut self, oracle: Oracle) -> Result<(), LedgerError>;

    fn oracle_request(&self, key: &OracleRequestKey) -> Option<&OracleRequest>;

    fn oracle_request_mut(&mut self, key: &OracleRequestKey) -> Option<&mut OracleRequest>;

    /// Insert or replace the request stored under its key
    fn put_oracle_request(&mut self, request: OracleRequest);

    // === Settlement ===

    fn record_reconciliation_failure(&mut self, record: ReconciliationRecord);

    fn reconciliation_failures(&self) -> &[ReconciliationRecord];

    // === Outbox ===

    /// Buffer an event; published by the caller after commit
    fn emit(&mut self, event: SuretyEvent);

    fn drain_events(&mut self) -> Vec<SuretyEvent>;

    // === Read-only queries ===

    fn is_airline(&self, id: &Principal) -> bool {
        self.airline(id).is_some_and(|a| a.registered)
    }

    fn is_airline_active(&self, id: &Principal) -> bool {
        self.airline(id).is_some_and(|a| a.registered && a.active)
    }

    fn get_airline_funds(&self, id: &Principal) -> Result<Amount, LedgerError> {
        self.airline(id)
            .map(|a| a.funds_contributed)
            .ok_or_else(|| LedgerError::AirlineNotFound(id.clone()))
    }

    fn is_flight_registered(&self, key: &FlightKey) -> bool {
        self.flight(key).is_some_and(|f| f.registered)
    }

    fn is_oracle_registered(&self, id: &Principal) -> bool {
        self.oracle(id).is_some_and(|o| o.registered)
    }
}

/// Run `op` against a draft copy of `store`; commit only if it succeeds.
///
/// On error the draft (including its buffered events) is dropped and
/// `store` is untouched.
pub fn atomically<S, T, E, F>(store: &mut S, op: F) -> Result<T, E>
where
    S: LedgerStore + Clone,
    F: FnOnce(&mut S) -> Result<T, E>,
{
    let mut draft = store.clone();
    let output = op(&mut draft)?;
    *store = draft;
    Ok(output)
}
