//! Oracle simulator
//!
//! Stands in for external oracle agents. Each agent registers with the
//! coordinator, then answers every `OracleRequested` event whose index it
//! holds, either with a forced status or one drawn from a seeded RNG.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strum::IntoEnumIterator;
use surety_core::{FlightKey, FlightStatus, Principal, SuretyEvent};
use surety_events::EventReceiver;
use surety_oracle::ResponseOutcome;
use tokio::sync::broadcast::error::TryRecvError;

use crate::context::AppContext;
use crate::error::SuretyError;

#[derive(Debug, Clone)]
pub struct OracleAgent {
    pub id: Principal,
    pub indexes: Vec<u8>,
}

/// One answered request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub oracle: Principal,
    pub index: u8,
    pub flight: FlightKey,
    pub status: FlightStatus,
    pub outcome: ResponseOutcome,
}

pub struct OracleSimulator {
    agents: Vec<OracleAgent>,
    rng: StdRng,
    forced: Option<FlightStatus>,
}

impl OracleSimulator {
    /// Register `count` agents named `ORACLE-001`.. paying the configured fee
    pub fn register(
        ctx: &mut AppContext,
        count: usize,
        seed: u64,
        forced: Option<FlightStatus>,
    ) -> Result<Self, SuretyError> {
        let fee = ctx.config().oracle.registration_fee;
        let mut agents = Vec::with_capacity(count);

        for n in 1..=count {
            let id = Principal::new(format!("ORACLE-{n:03}"));
            let indexes = ctx.register_oracle(&id, fee)?;
            agents.push(OracleAgent { id, indexes });
        }

        tracing::info!(agents = count, seed, ?forced, "Oracle simulator started");
        Ok(Self::from_agents(agents, seed, forced))
    }

    /// Wrap agents that are already registered
    pub fn from_agents(agents: Vec<OracleAgent>, seed: u64, forced: Option<FlightStatus>) -> Self {
        Self {
            agents,
            rng: StdRng::seed_from_u64(seed),
            forced,
        }
    }

    pub fn agents(&self) -> &[OracleAgent] {
        &self.agents
    }

    /// Agents able to answer requests tagged with `index`
    pub fn holders(&self, index: u8) -> impl Iterator<Item = &OracleAgent> {
        self.agents.iter().filter(move |a| a.indexes.contains(&index))
    }

    fn pick_status(&mut self) -> FlightStatus {
        if let Some(status) = self.forced {
            return status;
        }
        let all: Vec<FlightStatus> = FlightStatus::iter().collect();
        all.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Have every agent holding `index` answer for `flight`
    pub fn answer(
        &mut self,
        ctx: &mut AppContext,
        index: u8,
        flight: &FlightKey,
    ) -> Result<Vec<Answer>, SuretyError> {
        let responders: Vec<Principal> = self.holders(index).map(|a| a.id.clone()).collect();
        let mut answers = Vec::with_capacity(responders.len());

        for oracle in responders {
            let status = self.pick_status();
            let outcome = ctx.submit_oracle_response(&oracle, index, flight, status)?;
            tracing::debug!(oracle = %oracle, index, flight = %flight, %status, ?outcome, "Simulated response");
            answers.push(Answer {
                oracle,
                index,
                flight: flight.clone(),
                status,
                outcome,
            });
        }

        Ok(answers)
    }

    /// Answer every request waiting on `rx`; returns the answers given
    pub fn process_pending(
        &mut self,
        ctx: &mut AppContext,
        rx: &mut EventReceiver,
    ) -> Result<Vec<Answer>, SuretyError> {
        let mut answers = Vec::new();

        loop {
            match rx.try_recv() {
                Ok(envelope) => {
                    if let SuretyEvent::OracleRequested { index, flight } = &envelope.event {
                        answers.extend(self.answer(ctx, *index, flight)?);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Simulator lagged behind event bus");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        Ok(answers)
    }
}

