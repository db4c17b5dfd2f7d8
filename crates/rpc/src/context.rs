//! Application context - wires everything together
//!
//! Owns the ledger and the engines. Every mutating call runs through
//! [`AppContext::transact`]: operational check, the operation on a draft,
//! the draft's events appended to the journal, and only then the draft
//! swapped in and the events broadcast. A journal failure aborts the
//! operation with the ledger untouched.

use std::path::Path;
use std::sync::Arc;

use surety_core::{Amount, FlightKey, FlightStatus, Principal, SuretyConfig, SuretyEvent};
use surety_events::{EventBus, EventEnvelope, EventJournal, EventReader, EventReceiver};
use surety_governance::{AdmissionOutcome, FundingOutcome, GovernanceEngine};
use surety_ledger::{
    authorize, AccessDenied, Capability, InMemoryLedger, LedgerStore, ReconciliationRecord,
};
use surety_oracle::{
    FetchOutcome, HashIndexGenerator, IndexGenerator, OracleCoordinator, ResponseOutcome,
};
use surety_policy::{PolicyEngine, PurchaseReceipt};
use surety_settlement::{FundsTransfer, Settlement, TransferReceipt};

use crate::error::SuretyError;

/// Engines handed to each transaction alongside the ledger draft
pub struct Engines {
    pub governance: GovernanceEngine,
    pub policy: PolicyEngine,
    pub oracle: OracleCoordinator,
}

pub struct AppContext {
    config: SuretyConfig,
    ledger: InMemoryLedger,
    engines: Engines,
    settlement: Settlement,
    bus: EventBus,
    journal: Option<EventJournal>,
}

impl AppContext {
    /// Create a context whose genesis airline is registered but unfunded
    pub fn new(
        config: SuretyConfig,
        owner: Principal,
        genesis_airline: Principal,
        genesis_name: &str,
        transfer: Arc<dyn FundsTransfer>,
    ) -> Self {
        let ledger = InMemoryLedger::with_genesis_airline(owner, genesis_airline, genesis_name);
        let policy = PolicyEngine::new(config.policy.clone());
        let engines = Engines {
            governance: GovernanceEngine::new(config.governance.clone()),
            oracle: OracleCoordinator::new(config.oracle.clone(), policy.clone()),
            policy,
        };

        Self {
            config,
            ledger,
            engines,
            settlement: Settlement::new(transfer),
            bus: EventBus::new(),
            journal: None,
        }
    }

    /// Replace the index generator (seeded hash by default)
    pub fn with_index_generator(mut self, generator: Box<dyn IndexGenerator>) -> Self {
        self.engines.oracle = OracleCoordinator::with_generator(
            self.config.oracle.clone(),
            self.engines.policy.clone(),
            generator,
        );
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_index_generator(Box::new(HashIndexGenerator::from_seed(seed)))
    }

    /// Record committed events under `journal_path`.
    ///
    /// Sequence numbers continue after the last recorded event. Call before
    /// subscribing: existing subscriptions are dropped.
    pub fn with_journal(mut self, journal_path: impl AsRef<Path>) -> Result<Self, SuretyError> {
        let journal_path = journal_path.as_ref();
        let journal = EventJournal::open(journal_path)?;
        let last = EventReader::from_directory(journal_path)?
            .last_sequence()?
            .unwrap_or(0);

        tracing::info!(path = %journal_path.display(), last_sequence = last, "Event journal attached");
        self.bus = EventBus::new().resume_from(last);
        self.journal = Some(journal);
        Ok(self)
    }

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.bus.subscribe()
    }

    pub fn last_sequence(&self) -> u64 {
        self.bus.last_sequence()
    }

    /// Run `op` atomically against the ledger and publish its events
    pub fn transact<T, E, F>(&mut self, op: F) -> Result<T, SuretyError>
    where
        E: Into<SuretyError>,
        F: FnOnce(&Engines, &mut InMemoryLedger) -> Result<T, E>,
    {
        if !self.ledger.is_operational() {
            tracing::warn!("Operation rejected: contract not operational");
            return Err(SuretyError::NotOperational);
        }
        self.commit(op)
    }

    /// Journal first, apply second
    fn commit<T, E, F>(&mut self, op: F) -> Result<T, SuretyError>
    where
        E: Into<SuretyError>,
        F: FnOnce(&Engines, &mut InMemoryLedger) -> Result<T, E>,
    {
        let mut draft = self.ledger.clone();
        let output = op(&self.engines, &mut draft).map_err(|e| {
            let e: SuretyError = e.into();
            tracing::warn!(error = %e, "Operation rejected");
            e
        })?;

        let envelopes = self.bus.stamp(draft.drain_events());
        if let Some(journal) = &self.journal {
            journal.append_batch(&envelopes).map_err(|e| {
                tracing::error!(error = %e, events = envelopes.len(), "Journal append failed, operation aborted");
                SuretyError::from(e)
            })?;
        }

        self.install(draft, envelopes);
        Ok(output)
    }

    fn install(&mut self, ledger: InMemoryLedger, envelopes: Vec<EventEnvelope>) {
        self.ledger = ledger;
        self.bus.broadcast(envelopes);
    }

    // === Operational status ===

    pub fn is_operational(&self) -> bool {
        self.ledger.is_operational()
    }

    /// Owner-only. Returns whether the status changed.
    pub fn set_operating_status(
        &mut self,
        sender: &Principal,
        operational: bool,
    ) -> Result<bool, SuretyError> {
        let changed = self.commit(|_, draft| -> Result<bool, SuretyError> {
            authorize(draft, sender, Capability::Owner)?;
            if draft.is_operational() == operational {
                return Ok(false);
            }
            draft.set_operational(operational);
            draft.emit(SuretyEvent::OperationalStatusChanged { operational });
            Ok(true)
        })?;

        if changed {
            tracing::info!(operational, "Operational status changed");
        }
        Ok(changed)
    }

    // === Governance ===

    pub fn register_airline(
        &mut self,
        sender: &Principal,
        candidate: &Principal,
        name: &str,
    ) -> Result<AdmissionOutcome, SuretyError> {
        self.transact(|engines, ledger| {
            engines
                .governance
                .register_airline(ledger, candidate, name, sender)
        })
    }

    pub fn fund_airline(
        &mut self,
        sender: &Principal,
        amount: Amount,
    ) -> Result<FundingOutcome, SuretyError> {
        self.transact(|engines, ledger| -> Result<FundingOutcome, SuretyError> {
            match engines.governance.fund_airline(ledger, sender, amount)? {
                FundingOutcome::UnknownAirline => {
                    Err(SuretyError::Unauthorized(AccessDenied::NotAirline(sender.clone())))
                }
                funded => Ok(funded),
            }
        })
    }

    // === Flights & insurance ===

    pub fn register_flight(
        &mut self,
        sender: &Principal,
        airline: &Principal,
        designator: &str,
        timestamp: u64,
    ) -> Result<bool, SuretyError> {
        self.transact(|engines, ledger| {
            engines
                .policy
                .register_flight(ledger, airline, designator, timestamp, sender)
        })
    }

    pub fn buy_flight_insurance(
        &mut self,
        sender: &Principal,
        airline: &Principal,
        designator: &str,
        timestamp: u64,
        premium: Amount,
    ) -> Result<PurchaseReceipt, SuretyError> {
        let flight = FlightKey::new(airline.clone(), designator, timestamp);
        self.transact(|engines, ledger| {
            engines.policy.buy_insurance(ledger, &flight, sender, premium)
        })
    }

    // === Oracles ===

    pub fn register_oracle(
        &mut self,
        sender: &Principal,
        fee: Amount,
    ) -> Result<Vec<u8>, SuretyError> {
        self.transact(|engines, ledger| engines.oracle.register_oracle(ledger, sender, fee))
    }

    pub fn register_oracle_with_indexes(
        &mut self,
        sender: &Principal,
        oracle: &Principal,
        indexes: Vec<u8>,
        fee: Amount,
    ) -> Result<Vec<u8>, SuretyError> {
        self.transact(|engines, ledger| {
            engines
                .oracle
                .register_oracle_with_indexes(ledger, sender, oracle, indexes, fee)
        })
    }

    pub fn fetch_flight_status(
        &mut self,
        sender: &Principal,
        airline: &Principal,
        designator: &str,
        timestamp: u64,
    ) -> Result<FetchOutcome, SuretyError> {
        let flight = FlightKey::new(airline.clone(), designator, timestamp);
        self.transact(|engines, ledger| engines.oracle.fetch_flight_status(ledger, &flight, sender))
    }

    pub fn submit_oracle_response(
        &mut self,
        sender: &Principal,
        index: u8,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<ResponseOutcome, SuretyError> {
        self.transact(|engines, ledger| {
            engines
                .oracle
                .submit_oracle_response(ledger, index, flight, status, sender)
        })
    }

    // === Settlement ===

    /// Pull `sender`'s whole balance out through the transfer collaborator.
    ///
    /// The debit commits before the transfer starts. Once the transfer has
    /// run its outcome is committed whatever happens to the journal, and the
    /// caller always gets the settlement result.
    pub async fn withdraw_balance(
        &mut self,
        sender: &Principal,
    ) -> Result<TransferReceipt, SuretyError> {
        let settlement = self.settlement.clone();
        let amount = self.transact(|_, ledger| settlement.debit(ledger, sender))?;

        let mut draft = self.ledger.clone();
        let result = settlement.release(&mut draft, sender, amount).await;

        let envelopes = self.bus.stamp(draft.drain_events());
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append_batch(&envelopes) {
                tracing::error!(passenger = %sender, %amount, error = %e, "Withdrawal outcome missing from journal");
            }
        }
        self.install(draft, envelopes);

        result.map_err(|e| {
            let e = SuretyError::from(e);
            tracing::warn!(passenger = %sender, error = %e, "Withdrawal failed");
            e
        })
    }

    // === Queries ===

    pub fn is_airline(&self, airline: &Principal) -> bool {
        self.ledger.is_airline(airline)
    }

    pub fn is_airline_active(&self, airline: &Principal) -> bool {
        self.ledger.is_airline_active(airline)
    }

    pub fn get_airline_funds(&self, airline: &Principal) -> Result<Amount, SuretyError> {
        Ok(self.ledger.get_airline_funds(airline)?)
    }

    pub fn is_flight_registered(&self, airline: &Principal, designator: &str, timestamp: u64) -> bool {
        self.ledger
            .is_flight_registered(&FlightKey::new(airline.clone(), designator, timestamp))
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<FlightStatus> {
        self.ledger.flight(flight).map(|f| f.status)
    }

    pub fn get_balance(&self, principal: &Principal) -> Amount {
        self.ledger.get_balance(principal)
    }

    pub fn is_oracle_registered(&self, oracle: &Principal) -> bool {
        self.ledger.is_oracle_registered(oracle)
    }

    pub fn get_my_indexes(&self, oracle: &Principal) -> Result<Vec<u8>, SuretyError> {
        Ok(self.engines.oracle.oracle_indexes(&self.ledger, oracle)?)
    }

    pub fn reconciliation_failures(&self) -> &[ReconciliationRecord] {
        self.ledger.reconciliation_failures()
    }
}
