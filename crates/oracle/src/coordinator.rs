//! Oracle coordinator
//!
//! Request lifecycle per (index, flight): Open -> Resolved. A request
//! resolves the moment one status is backed by `quorum` distinct oracles.
//! The first resolution for a flight finalizes it and triggers payouts;
//! anything after that is inert.

use std::collections::BTreeSet;

use surety_core::{Amount, FlightKey, FlightStatus, OracleConfig, Principal, SuretyEvent};
use surety_ledger::{
    authorize, Capability, LedgerError, LedgerStore, Oracle, OracleRequest, OracleRequestKey,
};
use surety_policy::{PayoutSummary, PolicyEngine};

use crate::error::OracleError;
use crate::generator::{HashIndexGenerator, IndexGenerator};

/// Result of `fetch_flight_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new request was opened
    Requested { index: u8, flight: FlightKey },
    /// An open request already existed under this key; its event was re-emitted
    Pending { index: u8, flight: FlightKey, votes: usize },
    /// Flight status is final; no request opened
    AlreadyResolved { status: FlightStatus },
}

/// Result of `submit_oracle_response`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Vote stored, quorum not yet reached
    Recorded { votes: usize, quorum: usize },
    /// This vote completed the quorum
    Resolved {
        status: FlightStatus,
        /// False when another request had already finalized the flight
        flight_finalized: bool,
        payout: PayoutSummary,
    },
    /// Request was already resolved; nothing changed
    AlreadyResolved { status: FlightStatus },
}

#[derive(Debug)]
pub struct OracleCoordinator {
    config: OracleConfig,
    generator: Box<dyn IndexGenerator>,
    policy: PolicyEngine,
}

impl OracleCoordinator {
    pub fn new(config: OracleConfig, policy: PolicyEngine) -> Self {
        Self::with_generator(config, policy, Box::new(HashIndexGenerator::from_seed(0)))
    }

    pub fn with_generator(
        config: OracleConfig,
        policy: PolicyEngine,
        generator: Box<dyn IndexGenerator>,
    ) -> Self {
        Self {
            config,
            generator,
            policy,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    // === Registration ===

    /// Register `sender` as an oracle with generated indexes
    pub fn register_oracle<S: LedgerStore>(
        &self,
        store: &mut S,
        sender: &Principal,
        fee: Amount,
    ) -> Result<Vec<u8>, OracleError> {
        self.check_registration(store, sender, fee)?;

        let indexes = self.generator.assign_indexes(
            sender,
            self.config.indexes_per_oracle,
            self.config.index_range,
        );
        self.validate_indexes(&indexes)?;

        self.insert_oracle(store, sender, indexes, fee)
    }

    /// Owner-only registration with a caller-chosen index set
    pub fn register_oracle_with_indexes<S: LedgerStore>(
        &self,
        store: &mut S,
        sender: &Principal,
        oracle: &Principal,
        indexes: Vec<u8>,
        fee: Amount,
    ) -> Result<Vec<u8>, OracleError> {
        authorize(store, sender, Capability::Owner)?;
        self.check_registration(store, oracle, fee)?;
        self.validate_indexes(&indexes)?;

        let mut indexes = indexes;
        indexes.sort_unstable();
        self.insert_oracle(store, oracle, indexes, fee)
    }

    /// Indexes assigned to `oracle`
    pub fn oracle_indexes<S: LedgerStore>(
        &self,
        store: &S,
        oracle: &Principal,
    ) -> Result<Vec<u8>, OracleError> {
        store
            .oracle(oracle)
            .filter(|o| o.registered)
            .map(|o| o.indexes.clone())
            .ok_or_else(|| LedgerError::OracleNotFound(oracle.clone()).into())
    }

    fn check_registration<S: LedgerStore>(
        &self,
        store: &S,
        oracle: &Principal,
        fee: Amount,
    ) -> Result<(), OracleError> {
        if store.is_oracle_registered(oracle) {
            return Err(OracleError::AlreadyRegistered(oracle.clone()));
        }
        if fee < self.config.registration_fee {
            return Err(OracleError::InsufficientFee {
                required: self.config.registration_fee,
                offered: fee,
            });
        }
        Ok(())
    }

    fn validate_indexes(&self, indexes: &[u8]) -> Result<(), OracleError> {
        if indexes.is_empty() {
            return Err(OracleError::InvalidIndexes {
                reason: "empty index set".to_string(),
            });
        }
        if let Some(bad) = indexes.iter().find(|i| **i >= self.config.index_range) {
            return Err(OracleError::InvalidIndexes {
                reason: format!("index {} outside 0..{}", bad, self.config.index_range),
            });
        }
        let distinct: BTreeSet<_> = indexes.iter().collect();
        if distinct.len() != indexes.len() {
            return Err(OracleError::InvalidIndexes {
                reason: "duplicate index".to_string(),
            });
        }
        Ok(())
    }

    fn insert_oracle<S: LedgerStore>(
        &self,
        store: &mut S,
        oracle: &Principal,
        indexes: Vec<u8>,
        fee: Amount,
    ) -> Result<Vec<u8>, OracleError> {
        store.insert_oracle(Oracle {
            id: oracle.clone(),
            indexes: indexes.clone(),
            registered: true,
            fee_paid: fee,
        })?;
        store.emit(SuretyEvent::OracleRegistered {
            oracle: oracle.clone(),
            indexes: indexes.clone(),
        });
        tracing::info!(oracle = %oracle, ?indexes, "Oracle registered");

        Ok(indexes)
    }

    // === Requests ===

    /// Ask oracles for the status of a registered flight
    pub fn fetch_flight_status<S: LedgerStore>(
        &self,
        store: &mut S,
        flight: &FlightKey,
        requester: &Principal,
    ) -> Result<FetchOutcome, OracleError> {
        let status = store
            .flight(flight)
            .filter(|f| f.registered)
            .map(|f| f.status)
            .ok_or_else(|| LedgerError::FlightNotFound(flight.clone()))?;

        if status.is_final() {
            tracing::debug!(flight = %flight, %status, "Flight already resolved");
            return Ok(FetchOutcome::AlreadyResolved { status });
        }

        let index = self.generator.next_index(requester, self.config.index_range);
        let key = OracleRequestKey::new(index, flight.clone());

        let outcome = match store.oracle_request(&key) {
            Some(existing) if existing.is_open() => FetchOutcome::Pending {
                index,
                flight: flight.clone(),
                votes: existing.responses.len(),
            },
            _ => {
                store.put_oracle_request(OracleRequest::open(key, requester.clone()));
                FetchOutcome::Requested {
                    index,
                    flight: flight.clone(),
                }
            }
        };

        store.emit(SuretyEvent::OracleRequested {
            index,
            flight: flight.clone(),
        });
        tracing::info!(flight = %flight, index, requester = %requester, "Oracle request emitted");

        Ok(outcome)
    }

    /// Record one oracle's answer to an open request
    pub fn submit_oracle_response<S: LedgerStore>(
        &self,
        store: &mut S,
        index: u8,
        flight: &FlightKey,
        status: FlightStatus,
        oracle: &Principal,
    ) -> Result<ResponseOutcome, OracleError> {
        authorize(store, oracle, Capability::OracleIndex(index))?;

        let key = OracleRequestKey::new(index, flight.clone());
        let request = store
            .oracle_request_mut(&key)
            .ok_or_else(|| LedgerError::RequestNotFound {
                index,
                flight: flight.clone(),
            })?;

        if let Some(resolved) = request.resolved {
            tracing::debug!(flight = %flight, index, oracle = %oracle, "Response to resolved request ignored");
            return Ok(ResponseOutcome::AlreadyResolved { status: resolved });
        }

        let votes = request.record(oracle.clone(), status);
        let quorum = self.config.quorum;
        if votes >= quorum {
            request.resolved = Some(status);
        }

        store.emit(SuretyEvent::OracleReported {
            index,
            flight: flight.clone(),
            oracle: oracle.clone(),
            status,
        });
        tracing::info!(flight = %flight, index, oracle = %oracle, %status, votes, "Oracle response recorded");

        if votes < quorum {
            return Ok(ResponseOutcome::Recorded { votes, quorum });
        }

        self.resolve(store, flight, status)
    }

    fn resolve<S: LedgerStore>(
        &self,
        store: &mut S,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<ResponseOutcome, OracleError> {
        let record = store
            .flight_mut(flight)
            .ok_or_else(|| LedgerError::FlightNotFound(flight.clone()))?;

        if record.status.is_final() || !status.is_final() {
            tracing::info!(
                flight = %flight,
                %status,
                current = %record.status,
                "Request resolved without finalizing flight"
            );
            return Ok(ResponseOutcome::Resolved {
                status,
                flight_finalized: false,
                payout: PayoutSummary::default(),
            });
        }

        record.status = status;
        store.emit(SuretyEvent::FlightStatusResolved {
            flight: flight.clone(),
            status,
        });
        tracing::info!(flight = %flight, %status, "Flight status resolved");

        let payout = self.policy.credit_payout(store, flight, status)?;

        Ok(ResponseOutcome::Resolved {
            status,
            flight_finalized: true,
            payout,
        })
    }
}
