//! Daily check-in: how the person slept, how they feel, how much time they
//! have and which body parts they want to train today.

use crate::store::UserMetricSink;
use crate::types::{BodyPart, PersonId, UserMetricRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;

pub const ENERGY_LEVEL: RangeInclusive<u8> = 1..=10;
pub const SLEEP_HOURS: RangeInclusive<f64> = 0.0..=24.0;

/// Check-in values as entered
#[derive(Clone, Debug, PartialEq)]
pub struct CheckInForm {
    pub sleep_hours: f64,
    pub energy_level: u8,
    /// Minutes
    pub available_time: u32,
    /// Selection order is kept
    pub targets: Vec<BodyPart>,
    pub notes: String,
}

impl Default for CheckInForm {
    fn default() -> Self {
        Self {
            sleep_hours: 7.0,
            energy_level: 5,
            available_time: 60,
            targets: Vec::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckIn {
    form: CheckInForm,
    submitting: bool,
}

fn check_energy(level: u8) -> Result<()> {
    if ENERGY_LEVEL.contains(&level) {
        Ok(())
    } else {
        Err(Error::InvalidEnergyLevel(level))
    }
}

fn check_sleep(hours: f64) -> Result<()> {
    if hours.is_finite() && SLEEP_HOURS.contains(&hours) {
        Ok(())
    } else {
        Err(Error::InvalidSleepHours(hours))
    }
}

impl CheckIn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &CheckInForm {
        &self.form
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_sleep_hours(&mut self, hours: f64) -> Result<()> {
        check_sleep(hours)?;
        self.form.sleep_hours = hours;
        Ok(())
    }

    pub fn set_energy_level(&mut self, level: u8) -> Result<()> {
        check_energy(level)?;
        self.form.energy_level = level;
        Ok(())
    }

    pub fn set_available_time(&mut self, minutes: u32) {
        self.form.available_time = minutes;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.form.notes = notes.into();
    }

    /// Select `part`, or deselect it if already selected. Returns whether
    /// it is selected afterwards.
    pub fn toggle_target(&mut self, part: BodyPart) -> bool {
        match self.form.targets.iter().position(|p| *p == part) {
            Some(index) => {
                self.form.targets.remove(index);
                false
            }
            None => {
                self.form.targets.push(part);
                true
            }
        }
    }

    /// Record for the current form, dated `date`.
    pub fn to_record(&self, person: PersonId, date: DateTime<Utc>) -> Result<UserMetricRecord> {
        let form = &self.form;
        check_energy(form.energy_level)?;
        check_sleep(form.sleep_hours)?;

        let notes = form.notes.trim();
        Ok(UserMetricRecord {
            person_id: person,
            date,
            sleep_hours: Some(form.sleep_hours),
            energy_level: Some(form.energy_level),
            available_time: Some(form.available_time),
            target_workout: (!form.targets.is_empty()).then(|| form.targets.clone()),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }

    /// Send today's check-in. The form is kept either way.
    pub async fn submit(
        &mut self,
        person: PersonId,
        sink: &dyn UserMetricSink,
    ) -> Result<UserMetricRecord> {
        if self.submitting {
            return Err(Error::Busy);
        }
        let record = self.to_record(person, Utc::now())?;

        self.submitting = true;
        let result = sink.create_user_metric(&record).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                tracing::info!("Saved check-in for {}", person);
                Ok(record)
            }
            Err(e) => {
                tracing::warn!("Failed to save check-in for {}: {}", person, e);
                Err(Error::persistence(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<UserMetricRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl UserMetricSink for RecordingSink {
        async fn create_user_metric(&self, record: &UserMetricRecord) -> Result<()> {
            if self.fail {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "store down",
                )));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn test_defaults() {
        let checkin = CheckIn::new();
        assert_eq!(checkin.form().sleep_hours, 7.0);
        assert_eq!(checkin.form().energy_level, 5);
        assert_eq!(checkin.form().available_time, 60);
        assert!(checkin.form().targets.is_empty());
    }

    #[test]
    fn test_energy_level_bounds() {
        let mut checkin = CheckIn::new();
        assert!(matches!(
            checkin.set_energy_level(0),
            Err(Error::InvalidEnergyLevel(0))
        ));
        assert!(matches!(
            checkin.set_energy_level(11),
            Err(Error::InvalidEnergyLevel(11))
        ));
        assert_eq!(checkin.form().energy_level, 5);

        checkin.set_energy_level(1).unwrap();
        checkin.set_energy_level(10).unwrap();
        assert_eq!(checkin.form().energy_level, 10);
    }

    #[test]
    fn test_sleep_hours_bounds() {
        let mut checkin = CheckIn::new();
        assert!(checkin.set_sleep_hours(-0.5).is_err());
        assert!(checkin.set_sleep_hours(24.5).is_err());
        assert!(checkin.set_sleep_hours(f64::NAN).is_err());
        checkin.set_sleep_hours(0.0).unwrap();
        checkin.set_sleep_hours(8.5).unwrap();
        assert_eq!(checkin.form().sleep_hours, 8.5);
    }

    #[test]
    fn test_toggle_target() {
        let mut checkin = CheckIn::new();
        assert!(checkin.toggle_target(BodyPart::Chest));
        assert!(checkin.toggle_target(BodyPart::Back));
        assert!(!checkin.toggle_target(BodyPart::Chest));
        assert_eq!(checkin.form().targets, vec![BodyPart::Back]);
    }

    #[test]
    fn test_empty_selections_are_absent() {
        let mut checkin = CheckIn::new();
        checkin.set_notes("   ");
        let record = checkin.to_record(PersonId(1), Utc::now()).unwrap();
        assert_eq!(record.target_workout, None);
        assert_eq!(record.notes, None);
        assert_eq!(record.energy_level, Some(5));
    }

    #[tokio::test]
    async fn test_submit_sends_one_record() {
        let sink = RecordingSink::default();
        let mut checkin = CheckIn::new();
        checkin.set_energy_level(8).unwrap();
        checkin.set_available_time(45);
        checkin.toggle_target(BodyPart::Legs);
        checkin.set_notes("knee feels fine");

        let record = checkin.submit(PersonId(6), &sink).await.unwrap();

        let sent = sink.records.lock().unwrap().clone();
        assert_eq!(sent, vec![record.clone()]);
        assert_eq!(record.person_id, PersonId(6));
        assert_eq!(record.target_workout, Some(vec![BodyPart::Legs]));
        assert_eq!(record.notes.as_deref(), Some("knee feels fine"));
        assert!(!checkin.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_form() {
        let sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let mut checkin = CheckIn::new();
        checkin.set_energy_level(3).unwrap();

        let err = checkin.submit(PersonId(6), &sink).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistenceFailed);
        assert_eq!(checkin.form().energy_level, 3);
        assert!(!checkin.is_submitting());
    }
}
