//! Sequenced wrapper around a domain event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surety_core::SuretyEvent;

/// A committed event with its global position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Strictly increasing, starting at 1
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: SuretyEvent,
}

impl EventEnvelope {
    pub fn new(sequence: u64, event: SuretyEvent) -> Self {
        Self {
            sequence,
            recorded_at: Utc::now(),
            event,
        }
    }
}
