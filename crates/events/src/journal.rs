//! Append-only JSONL event journal, one file per day
//!
//! A batch is the event set of one committed operation. It is serialized in
//! full before any byte reaches disk and then written per day file with a
//! single `write_all`, so a serialization failure writes nothing.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::envelope::EventEnvelope;
use crate::error::EventError;

#[derive(Debug, Clone)]
pub struct EventJournal {
    dir: PathBuf,
}

impl EventJournal {
    /// Open (creating if needed) a journal directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, EventError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Day file an envelope lands in
    pub fn file_for(&self, envelope: &EventEnvelope) -> PathBuf {
        self.dir
            .join(format!("{}.jsonl", envelope.recorded_at.format("%Y-%m-%d")))
    }

    pub fn append(&self, envelope: &EventEnvelope) -> Result<(), EventError> {
        self.append_batch(std::slice::from_ref(envelope))
    }

    pub fn append_batch(&self, envelopes: &[EventEnvelope]) -> Result<(), EventError> {
        let mut by_file: BTreeMap<PathBuf, String> = BTreeMap::new();
        for envelope in envelopes {
            let lines = by_file.entry(self.file_for(envelope)).or_default();
            lines.push_str(&serde_json::to_string(envelope)?);
            lines.push('\n');
        }

        for (path, lines) in &by_file {
            // No create_dir_all here: a vanished journal directory is an error
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(lines.as_bytes())?;
            file.flush()?;
        }

        if let (Some(first), Some(last)) = (envelopes.first(), envelopes.last()) {
            tracing::debug!(first = first.sequence, last = last.sequence, "Journal batch written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use surety_core::SuretyEvent;
    use tempfile::tempdir;

    fn status_changed(sequence: u64, day: u32) -> EventEnvelope {
        EventEnvelope {
            sequence,
            recorded_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            event: SuretyEvent::OperationalStatusChanged { operational: sequence % 2 == 0 },
        }
    }

    #[test]
    fn test_batch_split_by_day() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let journal = EventJournal::open(dir.path())?;

        journal.append_batch(&[status_changed(1, 1), status_changed(2, 1), status_changed(3, 2)])?;

        let first = fs::read_to_string(dir.path().join("2026-03-01.jsonl"))?;
        let second = fs::read_to_string(dir.path().join("2026-03-02.jsonl"))?;
        assert_eq!(first.lines().count(), 2);
        assert_eq!(second.lines().count(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_batch_writes_nothing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let journal = EventJournal::open(dir.path())?;

        journal.append_batch(&[])?;
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_removed_directory_fails_append() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("journal");
        let journal = EventJournal::open(&path)?;

        fs::remove_dir_all(&path)?;
        let result = journal.append(&status_changed(1, 1));

        assert!(matches!(result, Err(EventError::Io(_))));
        assert!(!path.exists());
        Ok(())
    }
}
