//! Airline admission and funding

use surety_core::{Amount, GovernanceConfig, Principal, SuretyEvent};
use surety_ledger::{authorize, Airline, Capability, LedgerError, LedgerStore};

use crate::error::GovernanceError;

/// Result of a `register_airline` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Admitted without a vote (airline set still below the bootstrap size)
    Bootstrapped,
    /// Admitted because this vote met the threshold
    Admitted { votes: usize },
    /// Vote recorded, candidate still pending
    VoteRecorded { votes: usize, required: usize },
    /// Sender had already voted for this candidate; nothing changed
    DuplicateVote { votes: usize, required: usize },
    /// Candidate is already a registered airline; nothing changed
    AlreadyRegistered,
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(
            self,
            AdmissionOutcome::Bootstrapped | AdmissionOutcome::Admitted { .. }
        )
    }
}

/// Result of a `fund_airline` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    Funded {
        total: Amount,
        active: bool,
        /// True if this contribution flipped the airline to active
        activated: bool,
    },
    /// Sender is not a known airline; no state change
    UnknownAirline,
}

/// Governance engine
///
/// Stateless apart from its configuration; all state lives in the
/// `LedgerStore` passed to each call.
#[derive(Debug, Clone, Default)]
pub struct GovernanceEngine {
    config: GovernanceConfig,
}

impl GovernanceEngine {
    pub fn new(config: GovernanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Votes a pending candidate currently needs
    pub fn votes_required<S: LedgerStore>(&self, store: &S) -> usize {
        self.config.votes_required(store.registered_airline_count())
    }

    /// Admit `candidate`, or record `sender`'s vote for it
    pub fn register_airline<S: LedgerStore>(
        &self,
        store: &mut S,
        candidate: &Principal,
        name: &str,
        sender: &Principal,
    ) -> Result<AdmissionOutcome, GovernanceError> {
        authorize(store, sender, Capability::ActiveAirline)?;

        if store.is_airline(candidate) {
            tracing::debug!(candidate = %candidate, "Airline already registered");
            return Ok(AdmissionOutcome::AlreadyRegistered);
        }

        let registered = store.registered_airline_count();

        if registered < self.config.bootstrap_airlines {
            self.admit(store, candidate, name, 0)?;
            tracing::info!(
                candidate = %candidate,
                sponsor = %sender,
                registered = registered + 1,
                "Airline admitted during bootstrap"
            );
            return Ok(AdmissionOutcome::Bootstrapped);
        }

        let required = self.config.votes_required(registered);
        let pending = store.open_admission(candidate, name);
        let fresh = pending.add_vote(sender.clone());
        let votes = pending.votes();

        if !fresh {
            tracing::debug!(candidate = %candidate, voter = %sender, "Duplicate vote ignored");
            return Ok(AdmissionOutcome::DuplicateVote { votes, required });
        }

        if votes >= required {
            let pending = store.take_pending_admission(candidate);
            let name = pending.map(|p| p.name).unwrap_or_else(|| name.to_string());
            self.admit(store, candidate, &name, votes)?;
            tracing::info!(
                candidate = %candidate,
                votes,
                required,
                "Airline admitted by consensus"
            );
            return Ok(AdmissionOutcome::Admitted { votes });
        }

        store.emit(SuretyEvent::AirlineVoteRecorded {
            candidate: candidate.clone(),
            voter: sender.clone(),
            votes,
            required,
        });
        tracing::info!(candidate = %candidate, voter = %sender, votes, required, "Admission vote recorded");

        Ok(AdmissionOutcome::VoteRecorded { votes, required })
    }

    /// Contribute `amount` to `sender`'s participation pool
    pub fn fund_airline<S: LedgerStore>(
        &self,
        store: &mut S,
        sender: &Principal,
        amount: Amount,
    ) -> Result<FundingOutcome, GovernanceError> {
        let minimum = self.config.minimum_participation_fee;

        let Some(airline) = store.airline_mut(sender) else {
            tracing::warn!(sender = %sender, "Funding from unknown airline ignored");
            return Ok(FundingOutcome::UnknownAirline);
        };

        if amount < minimum {
            return Err(GovernanceError::InsufficientFee {
                required: minimum,
                offered: amount,
            });
        }

        let total = airline
            .funds_contributed
            .checked_add(&amount)
            .ok_or_else(|| LedgerError::Overflow {
                account: sender.to_string(),
            })?;
        airline.funds_contributed = total;

        let activated = !airline.active && total >= minimum;
        if activated {
            airline.active = true;
        }
        let active = airline.active;

        store.emit(SuretyEvent::AirlineFunded {
            airline: sender.clone(),
            amount,
            total,
            active,
        });
        tracing::info!(airline = %sender, %amount, %total, active, "Airline funded");

        Ok(FundingOutcome::Funded {
            total,
            active,
            activated,
        })
    }

    fn admit<S: LedgerStore>(
        &self,
        store: &mut S,
        candidate: &Principal,
        name: &str,
        votes: usize,
    ) -> Result<(), GovernanceError> {
        store.insert_airline(Airline::admitted(candidate.clone(), name))?;
        store.emit(SuretyEvent::AirlineRegistered {
            airline: candidate.clone(),
            name: name.to_string(),
            votes,
        });
        Ok(())
    }
}
