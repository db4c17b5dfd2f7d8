//! Sequential journal reader for replay and inspection

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::envelope::EventEnvelope;
use crate::error::EventError;

pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        // Date-named files sort chronologically
        files.sort();

        Ok(Self { files })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Every envelope in journal order
    pub fn read_all(&self) -> Result<Vec<EventEnvelope>, EventError> {
        let mut envelopes = Vec::new();

        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);

            for (n, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let envelope: EventEnvelope =
                    serde_json::from_str(&line).map_err(|e| EventError::InvalidLine {
                        file: file_path.display().to_string(),
                        line: n + 1,
                        reason: e.to_string(),
                    })?;
                envelopes.push(envelope);
            }
        }

        Ok(envelopes)
    }

    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        Ok(self.read_all()?.last().map(|e| e.sequence))
    }

    pub fn count(&self) -> Result<usize, EventError> {
        Ok(self.read_all()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::EventJournal;
    use surety_core::{FlightKey, Principal, SuretyEvent};
    use tempfile::tempdir;

    fn registered(n: u64) -> EventEnvelope {
        EventEnvelope::new(
            n,
            SuretyEvent::FlightRegistered {
                flight: FlightKey::new(Principal::from("A1"), "ND1309", n),
            },
        )
    }

    #[test]
    fn test_journal_roundtrip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let journal = EventJournal::open(dir.path())?;
        let batch: Vec<_> = (1..=3).map(registered).collect();
        journal.append_batch(&batch)?;

        let reader = EventReader::from_directory(dir.path())?;
        let envelopes = reader.read_all()?;

        assert_eq!(envelopes.len(), 3);
        assert_eq!(envelopes[2].sequence, 3);
        assert_eq!(envelopes[2].event, registered(3).event);
        assert_eq!(reader.last_sequence()?, Some(3));
        assert_eq!(reader.files(), &[journal.file_for(&batch[0])]);
        Ok(())
    }

    #[test]
    fn test_reopened_journal_appends() -> anyhow::Result<()> {
        let dir = tempdir()?;
        EventJournal::open(dir.path())?.append(&registered(1))?;
        EventJournal::open(dir.path())?.append(&registered(2))?;

        let reader = EventReader::from_directory(dir.path())?;
        assert_eq!(reader.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_missing_directory_reads_empty() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reader = EventReader::from_directory(dir.path().join("absent"))?;
        assert!(reader.read_all()?.is_empty());
        assert_eq!(reader.last_sequence()?, None);
        Ok(())
    }

    #[test]
    fn test_corrupt_line_reported() -> anyhow::Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("2026-01-01.jsonl"), "{not json}\n")?;

        let reader = EventReader::from_directory(dir.path())?;
        let result = reader.read_all();
        assert!(matches!(result, Err(EventError::InvalidLine { line: 1, .. })));
        Ok(())
    }
}
