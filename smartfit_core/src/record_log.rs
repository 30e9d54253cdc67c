//! Local append-only record logs.
//!
//! Set records and daily check-ins are appended to JSONL (JSON Lines)
//! files with file locking so several processes can log at once. File
//! I/O runs on the blocking thread pool; appends to one file still happen
//! one at a time under the lock.

use crate::store::{SetRecordSink, UserMetricSink};
use crate::types::{LoggedSet, LoggedUserMetric, SetRecord, UserMetricRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// JSONL-based record sink with file locking
#[derive(Clone, Debug)]
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    /// Create a new log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn append<T: Serialize>(&self, entry: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        Ok(())
    }

    /// Append `entry` from the blocking thread pool.
    async fn append_blocking<T>(&self, entry: T) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let log = self.clone();
        tokio::task::spawn_blocking(move || log.append(&entry))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

#[async_trait]
impl SetRecordSink for JsonlLog {
    async fn create_set_record(&self, record: &SetRecord) -> Result<()> {
        let entry = LoggedSet {
            id: Uuid::new_v4(),
            logged_at: Utc::now(),
            record: record.clone(),
        };
        let (id, set_number, exercise) = (entry.id, record.set_number, record.exercise_name.clone());
        self.append_blocking(entry).await?;
        tracing::debug!("Logged set {} of {} ({})", set_number, exercise, id);
        Ok(())
    }
}

#[async_trait]
impl UserMetricSink for JsonlLog {
    async fn create_user_metric(&self, record: &UserMetricRecord) -> Result<()> {
        let entry = LoggedUserMetric {
            id: Uuid::new_v4(),
            logged_at: Utc::now(),
            record: record.clone(),
        };
        let id = entry.id;
        self.append_blocking(entry).await?;
        tracing::debug!("Logged check-in for {} ({})", record.person_id, id);
        Ok(())
    }
}

/// Read every entry of a JSONL log, skipping lines that do not parse
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse record at {:?} line {}: {}", path, line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} records from {:?}", entries.len(), path);
    Ok(entries)
}

/// Read all logged sets from a set log file
pub fn read_set_log(path: &Path) -> Result<Vec<LoggedSet>> {
    read_jsonl(path)
}

/// Read all check-ins from a check-in log file
pub fn read_checkin_log(path: &Path) -> Result<Vec<LoggedUserMetric>> {
    read_jsonl(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyPart, PersonId, Rating};
    use futures::future::join_all;

    fn create_test_record(set_number: u32) -> SetRecord {
        SetRecord {
            person_id: PersonId(1),
            exercise_name: "Squat".into(),
            set_number,
            reps: 5,
            weight: 100.0,
            rating: Some(Rating::try_from(8).unwrap()),
            completed: true,
        }
    }

    #[tokio::test]
    async fn test_append_and_read_single_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sets.jsonl");

        let log = JsonlLog::new(&log_path);
        log.create_set_record(&create_test_record(1)).await.unwrap();

        let entries = read_set_log(&log_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record, create_test_record(1));
    }

    #[tokio::test]
    async fn test_append_multiple_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("nested/sets.jsonl");

        let log = JsonlLog::new(&log_path);
        for n in 1..=5 {
            log.create_set_record(&create_test_record(n)).await.unwrap();
        }

        let entries = read_set_log(&log_path).unwrap();
        assert_eq!(entries.len(), 5);
        let numbers: Vec<u32> = entries.iter().map(|e| e.record.set_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_stay_whole_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sets.jsonl");
        let log = JsonlLog::new(&log_path);

        let records: Vec<SetRecord> = (1..=20).map(create_test_record).collect();
        let outcomes = join_all(records.iter().map(|r| log.create_set_record(r))).await;
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let mut numbers: Vec<u32> = read_set_log(&log_path)
            .unwrap()
            .iter()
            .map(|e| e.record.set_number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_set_log(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sets.jsonl");

        let log = JsonlLog::new(&log_path);
        log.create_set_record(&create_test_record(1)).await.unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
            writeln!(file, "{{ not json").unwrap();
        }
        log.create_set_record(&create_test_record(2)).await.unwrap();

        let entries = read_set_log(&log_path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_checkin_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("checkins.jsonl");
        let log = JsonlLog::new(&log_path);

        let record = UserMetricRecord {
            person_id: PersonId(4),
            date: Utc::now(),
            sleep_hours: Some(7.5),
            energy_level: Some(6),
            available_time: Some(60),
            target_workout: Some(vec![BodyPart::Legs]),
            notes: None,
        };
        log.create_user_metric(&record).await.unwrap();

        let entries = read_checkin_log(&log_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record, record);
    }
}
