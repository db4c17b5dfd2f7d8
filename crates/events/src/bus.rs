//! In-process event bus
//!
//! Uses a tokio broadcast channel. Publishing never blocks and never fails;
//! with no subscribers the envelope is simply dropped. Slow subscribers
//! lag and skip, they do not hold up the core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use surety_core::SuretyEvent;
use tokio::sync::broadcast;

use crate::envelope::EventEnvelope;

pub const DEFAULT_CAPACITY: usize = 1024;

pub type EventReceiver = broadcast::Receiver<Arc<EventEnvelope>>;

pub struct EventBus {
    tx: broadcast::Sender<Arc<EventEnvelope>>,
    sequence: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence: AtomicU64::new(0),
        }
    }

    /// Continue numbering after `last` (e.g. the journal's last sequence)
    pub fn resume_from(self, last: u64) -> Self {
        self.sequence.store(last, Ordering::SeqCst);
        self
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }

    /// Number `events` after the last published sequence without sending them.
    ///
    /// The counter only advances in [`EventBus::broadcast`], so a batch that
    /// is stamped and then abandoned leaves no gap.
    pub fn stamp(&self, events: Vec<SuretyEvent>) -> Vec<EventEnvelope> {
        let recorded_at = Utc::now();
        let last = self.last_sequence();
        events
            .into_iter()
            .zip(last + 1..)
            .map(|(event, sequence)| EventEnvelope {
                sequence,
                recorded_at,
                event,
            })
            .collect()
    }

    /// Send stamped envelopes to subscribers and advance the sequence
    pub fn broadcast(&self, envelopes: Vec<EventEnvelope>) {
        for envelope in envelopes {
            let sequence = envelope.sequence;
            self.sequence.fetch_max(sequence, Ordering::SeqCst);
            tracing::debug!(sequence, kind = envelope.event.kind(), "Event published");
            if self.tx.send(Arc::new(envelope)).is_err() {
                tracing::trace!(sequence, "No subscribers for event");
            }
        }
    }

    /// Stamp and broadcast a single event, returning its sequence
    pub fn publish(&self, event: SuretyEvent) -> u64 {
        let sequence = self.last_sequence() + 1;
        self.broadcast(vec![EventEnvelope::new(sequence, event)]);
        sequence
    }

    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sequence", &self.last_sequence())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(operational: bool) -> SuretyEvent {
        SuretyEvent::OperationalStatusChanged { operational }
    }

    #[test]
    fn test_stamp_does_not_advance_sequence() {
        let bus = EventBus::new().resume_from(7);
        let mut rx = bus.subscribe();

        let stamped = bus.stamp(vec![status(false), status(true)]);
        assert_eq!(stamped.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![8, 9]);
        assert_eq!(stamped[0].recorded_at, stamped[1].recorded_at);
        assert_eq!(bus.last_sequence(), 7);
        assert!(rx.try_recv().is_err());

        // Abandoned batch: the next one reuses the same numbers
        let stamped = bus.stamp(vec![status(true)]);
        assert_eq!(stamped[0].sequence, 8);

        bus.broadcast(stamped);
        assert_eq!(bus.last_sequence(), 8);
        assert_eq!(rx.try_recv().unwrap().event, status(true));
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(SuretyEvent::OperationalStatusChanged { operational: false });
        bus.publish(SuretyEvent::OperationalStatusChanged { operational: true });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(
            second.event,
            SuretyEvent::OperationalStatusChanged { operational: true }
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new().resume_from(41);
        let sequence = bus.publish(SuretyEvent::OperationalStatusChanged { operational: true });
        assert_eq!(sequence, 42);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
