//! In-memory ledger
//!
//! The only store implementation. Cloning it is how [`crate::atomically`]
//! takes a draft, so every field is plain owned data.

use std::collections::{BTreeMap, HashMap};

use surety_core::{Amount, FlightKey, Principal, SuretyEvent};

use crate::entity::{
    Airline, Flight, InsurancePolicy, Oracle, OracleRequest, OracleRequestKey, PendingAdmission,
    ReconciliationRecord,
};
use crate::error::LedgerError;
use crate::store::LedgerStore;

#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    owner: Principal,
    operational: bool,
    airlines: HashMap<Principal, Airline>,
    pending: HashMap<Principal, PendingAdmission>,
    flights: HashMap<FlightKey, Flight>,
    policies: HashMap<FlightKey, BTreeMap<Principal, InsurancePolicy>>,
    balances: HashMap<Principal, Amount>,
    oracles: HashMap<Principal, Oracle>,
    requests: HashMap<OracleRequestKey, OracleRequest>,
    reconciliation: Vec<ReconciliationRecord>,
    outbox: Vec<SuretyEvent>,
}

impl InMemoryLedger {
    /// Create an empty, operational ledger owned by `owner`
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            operational: true,
            airlines: HashMap::new(),
            pending: HashMap::new(),
            flights: HashMap::new(),
            policies: HashMap::new(),
            balances: HashMap::new(),
            oracles: HashMap::new(),
            requests: HashMap::new(),
            reconciliation: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Create a ledger with the genesis airline already registered
    pub fn with_genesis_airline(owner: Principal, airline: Principal, name: &str) -> Self {
        let mut ledger = Self::new(owner);
        ledger
            .airlines
            .insert(airline.clone(), Airline::admitted(airline, name));
        ledger
    }

    pub fn airlines(&self) -> impl Iterator<Item = &Airline> {
        self.airlines.values()
    }

    pub fn oracles(&self) -> impl Iterator<Item = &Oracle> {
        self.oracles.values()
    }

    pub fn open_requests(&self) -> impl Iterator<Item = &OracleRequest> {
        self.requests.values().filter(|r| r.is_open())
    }

    /// Sum of all claimable balances, None on overflow
    pub fn total_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(b))
    }
}

impl LedgerStore for InMemoryLedger {
    fn owner(&self) -> &Principal {
        &self.owner
    }

    fn is_operational(&self) -> bool {
        self.operational
    }

    fn set_operational(&mut self, operational: bool) {
        self.operational = operational;
    }

    fn airline(&self, id: &Principal) -> Option<&Airline> {
        self.airlines.get(id)
    }

    fn airline_mut(&mut self, id: &Principal) -> Option<&mut Airline> {
        self.airlines.get_mut(id)
    }

    fn insert_airline(&mut self, airline: Airline) -> Result<(), LedgerError> {
        if self.airlines.contains_key(&airline.id) {
            return Err(LedgerError::AirlineExists(airline.id));
        }
        self.airlines.insert(airline.id.clone(), airline);
        Ok(())
    }

    fn registered_airline_count(&self) -> usize {
        self.airlines.values().filter(|a| a.registered).count()
    }

    fn pending_admission(&self, candidate: &Principal) -> Option<&PendingAdmission> {
        self.pending.get(candidate)
    }

    fn open_admission(&mut self, candidate: &Principal, name: &str) -> &mut PendingAdmission {
        self.pending
            .entry(candidate.clone())
            .or_insert_with(|| PendingAdmission::new(candidate.clone(), name))
    }

    fn take_pending_admission(&mut self, candidate: &Principal) -> Option<PendingAdmission> {
        self.pending.remove(candidate)
    }

    fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    fn flight_mut(&mut self, key: &FlightKey) -> Option<&mut Flight> {
        self.flights.get_mut(key)
    }

    fn insert_flight(&mut self, flight: Flight) -> Result<(), LedgerError> {
        if self.flights.contains_key(&flight.key) {
            return Err(LedgerError::FlightExists(flight.key));
        }
        self.flights.insert(flight.key.clone(), flight);
        Ok(())
    }

    fn policy(&self, flight: &FlightKey, passenger: &Principal) -> Option<&InsurancePolicy> {
        self.policies.get(flight)?.get(passenger)
    }

    fn policy_entry(&mut self, flight: &FlightKey, passenger: &Principal) -> &mut InsurancePolicy {
        self.policies
            .entry(flight.clone())
            .or_default()
            .entry(passenger.clone())
            .or_insert_with(|| InsurancePolicy::new(flight.clone(), passenger.clone()))
    }

    fn flight_policies_mut(&mut self, flight: &FlightKey) -> Vec<&mut InsurancePolicy> {
        match self.policies.get_mut(flight) {
            Some(policies) => policies.values_mut().collect(),
            None => Vec::new(),
        }
    }

    fn get_balance(&self, principal: &Principal) -> Amount {
        self.balances.get(principal).copied().unwrap_or(Amount::ZERO)
    }

    fn credit_balance(
        &mut self,
        principal: &Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let current = self.get_balance(principal);
        let updated = current
            .checked_add(&amount)
            .ok_or_else(|| LedgerError::Overflow {
                account: principal.to_string(),
            })?;
        self.balances.insert(principal.clone(), updated);
        Ok(updated)
    }

    fn take_balance(&mut self, principal: &Principal) -> Amount {
        self.balances.remove(principal).unwrap_or(Amount::ZERO)
    }

    fn oracle(&self, id: &Principal) -> Option<&Oracle> {
        self.oracles.get(id)
    }

    fn insert_oracle(&mut self, oracle: Oracle) -> Result<(), LedgerError> {
        if self.oracles.contains_key(&oracle.id) {
            return Err(LedgerError::OracleExists(oracle.id));
        }
        self.oracles.insert(oracle.id.clone(), oracle);
        Ok(())
    }

    fn oracle_request(&self, key: &OracleRequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    fn oracle_request_mut(&mut self, key: &OracleRequestKey) -> Option<&mut OracleRequest> {
        self.requests.get_mut(key)
    }

    fn put_oracle_request(&mut self, request: OracleRequest) {
        self.requests.insert(request.key.clone(), request);
    }

    fn record_reconciliation_failure(&mut self, record: ReconciliationRecord) {
        tracing::error!(
            passenger = %record.passenger,
            amount = %record.amount,
            reason = %record.reason,
            "Reconciliation failure recorded"
        );
        self.reconciliation.push(record);
    }

    fn reconciliation_failures(&self) -> &[ReconciliationRecord] {
        &self.reconciliation
    }

    fn emit(&mut self, event: SuretyEvent) {
        self.outbox.push(event);
    }

    fn drain_events(&mut self) -> Vec<SuretyEvent> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::atomically;
    use rust_decimal_macros::dec;

    fn owner() -> Principal {
        Principal::from("OWNER")
    }

    #[test]
    fn test_genesis_airline_registered_not_active() {
        let ledger = InMemoryLedger::with_genesis_airline(owner(), "A1".into(), "Airline 1");
        assert!(ledger.is_airline(&"A1".into()));
        assert!(!ledger.is_airline_active(&"A1".into()));
        assert_eq!(ledger.registered_airline_count(), 1);
        assert_eq!(ledger.get_airline_funds(&"A1".into()).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_unknown_keys_are_false_or_zero() {
        let ledger = InMemoryLedger::new(owner());
        let nobody = Principal::from("NOBODY");
        assert!(!ledger.is_airline(&nobody));
        assert!(!ledger.is_airline_active(&nobody));
        assert!(!ledger.is_oracle_registered(&nobody));
        assert_eq!(ledger.get_balance(&nobody), Amount::ZERO);
        assert!(!ledger.is_flight_registered(&FlightKey::new(nobody.clone(), "X", 0)));
        assert_eq!(
            ledger.get_airline_funds(&nobody),
            Err(LedgerError::AirlineNotFound(nobody))
        );
    }

    #[test]
    fn test_duplicate_airline_rejected() {
        let mut ledger = InMemoryLedger::with_genesis_airline(owner(), "A1".into(), "Airline 1");
        let result = ledger.insert_airline(Airline::admitted("A1".into(), "Again"));
        assert!(matches!(result, Err(LedgerError::AirlineExists(_))));
    }

    #[test]
    fn test_balance_credit_and_take() {
        let mut ledger = InMemoryLedger::new(owner());
        let p = Principal::from("P1");

        ledger.credit_balance(&p, Amount::new(dec!(0.75)).unwrap()).unwrap();
        ledger.credit_balance(&p, Amount::new(dec!(0.25)).unwrap()).unwrap();
        assert_eq!(ledger.get_balance(&p).value(), dec!(1));
        assert_eq!(ledger.total_balances().unwrap().value(), dec!(1));

        assert_eq!(ledger.take_balance(&p).value(), dec!(1));
        assert_eq!(ledger.get_balance(&p), Amount::ZERO);
        assert_eq!(ledger.take_balance(&p), Amount::ZERO);
    }

    #[test]
    fn test_total_balances_reports_overflow() {
        let mut ledger = InMemoryLedger::new(owner());
        let max = Amount::new(rust_decimal::Decimal::MAX).unwrap();

        ledger.credit_balance(&"P1".into(), max).unwrap();
        assert_eq!(ledger.total_balances(), Some(max));

        ledger.credit_balance(&"P2".into(), max).unwrap();
        assert_eq!(ledger.total_balances(), None);
    }

    #[test]
    fn test_policies_grouped_by_flight() {
        let mut ledger = InMemoryLedger::new(owner());
        let flight = FlightKey::new("A1".into(), "ND1309", 1);
        let other = FlightKey::new("A1".into(), "ND1310", 1);

        ledger.policy_entry(&flight, &"P1".into()).premium_paid = Amount::units(1);
        ledger.policy_entry(&flight, &"P2".into());
        ledger.policy_entry(&other, &"P1".into());

        assert_eq!(ledger.flight_policies_mut(&flight).len(), 2);
        assert_eq!(
            ledger.policy(&flight, &"P1".into()).unwrap().premium_paid,
            Amount::units(1)
        );
        assert!(ledger.flight_policies_mut(&FlightKey::new("A2".into(), "X", 0)).is_empty());
    }

    #[test]
    fn test_atomically_rolls_back_state_and_events() {
        let mut ledger = InMemoryLedger::new(owner());
        let p = Principal::from("P1");

        let result: Result<(), anyhow::Error> = atomically(&mut ledger, |draft| {
            draft.credit_balance(&p, Amount::units(5))?;
            draft.emit(SuretyEvent::BalanceWithdrawn {
                passenger: p.clone(),
                amount: Amount::units(5),
            });
            anyhow::bail!("abort");
        });

        assert!(result.is_err());
        assert_eq!(ledger.get_balance(&p), Amount::ZERO);
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn test_atomically_commits_on_success() {
        let mut ledger = InMemoryLedger::new(owner());
        let p = Principal::from("P1");

        let balance = atomically(&mut ledger, |draft| {
            draft.emit(SuretyEvent::OperationalStatusChanged { operational: true });
            draft.credit_balance(&p, Amount::units(5))
        })
        .unwrap();

        assert_eq!(balance, Amount::units(5));
        assert_eq!(ledger.get_balance(&p), Amount::units(5));
        assert_eq!(ledger.drain_events().len(), 1);
        assert!(ledger.drain_events().is_empty());
    }
}
