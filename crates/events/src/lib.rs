//! Surety Events - distribution and persistence of committed events
//!
//! Events are published only after the operation that produced them has
//! committed. The bus fans them out to live subscribers (oracle agents,
//! UIs); the journal keeps a JSONL record for inspection and replay.

pub mod bus;
pub mod envelope;
pub mod error;
pub mod journal;
pub mod reader;

pub use bus::{EventBus, EventReceiver, DEFAULT_CAPACITY};
pub use envelope::EventEnvelope;
pub use error::EventError;
pub use journal::EventJournal;
pub use reader::EventReader;
