//! Profile editor: one person's body metrics and training preferences.
//!
//! The form holds what the person typed, in their display unit system.
//! Records are always persisted in metric; loading converts back into the
//! unit system stored with the record.

use crate::store::ProfileStore;
use crate::types::{ExperienceLevel, PersonId, PrimaryGoal, ProfileRecord, Sex};
use crate::units::{self, UnitSystem};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Editable profile fields, as entered
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileForm {
    pub height: String,
    pub weight: String,
    pub sex: Option<Sex>,
    pub age: String,
    pub unit_system: UnitSystem,
    pub experience_level: Option<ExperienceLevel>,
    pub primary_goal: Option<PrimaryGoal>,
    pub weekly_frequency: u8,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            height: String::new(),
            weight: String::new(),
            sex: None,
            age: String::new(),
            unit_system: UnitSystem::Metric,
            experience_level: None,
            primary_goal: None,
            weekly_frequency: 1,
        }
    }
}

impl ProfileForm {
    /// Form view of a stored record, in the record's own unit system
    pub fn from_record(record: &ProfileRecord) -> Self {
        let system = record.unit_system;
        Self {
            height: units::height_from_cm(record.height, system).to_string(),
            weight: units::weight_from_kg(record.weight, system).to_string(),
            sex: Some(record.sex),
            age: record.age.map(|a| a.to_string()).unwrap_or_default(),
            unit_system: system,
            experience_level: Some(record.experience_level),
            primary_goal: Some(record.primary_goal),
            weekly_frequency: record.weekly_frequency,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Height,
    Weight,
    Sex,
    Age,
    ExperienceLevel,
    PrimaryGoal,
    WeeklyFrequency,
}

/// New value for one form field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Height(String),
    Weight(String),
    Sex(Option<Sex>),
    Age(String),
    ExperienceLevel(Option<ExperienceLevel>),
    PrimaryGoal(Option<PrimaryGoal>),
    WeeklyFrequency(u8),
}

impl FieldValue {
    pub fn field(&self) -> ProfileField {
        match self {
            FieldValue::Height(_) => ProfileField::Height,
            FieldValue::Weight(_) => ProfileField::Weight,
            FieldValue::Sex(_) => ProfileField::Sex,
            FieldValue::Age(_) => ProfileField::Age,
            FieldValue::ExperienceLevel(_) => ProfileField::ExperienceLevel,
            FieldValue::PrimaryGoal(_) => ProfileField::PrimaryGoal,
            FieldValue::WeeklyFrequency(_) => ProfileField::WeeklyFrequency,
        }
    }
}

/// Result of a save attempt that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Validation failed; nothing was sent
    Invalid,
    Created,
    Updated,
}

#[derive(Debug, Default)]
pub struct ProfileEditor {
    form: ProfileForm,
    original: Option<ProfileForm>,
    errors: BTreeMap<ProfileField, String>,
    exists: bool,
    saving: bool,
}

fn parse_positive(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

impl ProfileEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn errors(&self) -> &BTreeMap<ProfileField, String> {
        &self.errors
    }

    pub fn error(&self, field: ProfileField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Whether a stored record exists for the loaded person
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Load the person's profile into the form.
    ///
    /// Returns `Ok(false)` and resets to an empty form with no snapshot
    /// when the person has no profile yet.
    pub async fn load(&mut self, person: PersonId, store: &dyn ProfileStore) -> Result<bool> {
        match store.fetch_profile(person).await {
            Ok(Some(record)) => {
                let form = ProfileForm::from_record(&record);
                self.original = Some(form.clone());
                self.form = form;
                self.errors.clear();
                self.exists = true;
                tracing::debug!("Loaded profile for {} ({})", person, record.unit_system);
                Ok(true)
            }
            Ok(None) => {
                tracing::debug!("No profile yet for {}", person);
                self.form = ProfileForm::default();
                self.original = None;
                self.errors.clear();
                self.exists = false;
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Failed to load profile for {}: {}", person, e);
                Err(e)
            }
        }
    }

    /// Set one field and clear its error.
    pub fn set_field(&mut self, value: FieldValue) {
        self.errors.remove(&value.field());
        match value {
            FieldValue::Height(v) => self.form.height = v,
            FieldValue::Weight(v) => self.form.weight = v,
            FieldValue::Sex(v) => self.form.sex = v,
            FieldValue::Age(v) => self.form.age = v,
            FieldValue::ExperienceLevel(v) => self.form.experience_level = v,
            FieldValue::PrimaryGoal(v) => self.form.primary_goal = v,
            FieldValue::WeeklyFrequency(v) => self.form.weekly_frequency = v,
        }
    }

    /// Switch the unit system. Entered values are not converted.
    pub fn set_unit_system(&mut self, system: UnitSystem) {
        self.form.unit_system = system;
    }

    /// Recompute field errors; true when there are none.
    pub fn validate(&mut self) -> bool {
        let form = &self.form;
        let system = form.unit_system;
        let mut errors = BTreeMap::new();

        match parse_positive(&form.height) {
            None => {
                errors.insert(ProfileField::Height, "Height is required".to_string());
            }
            Some(h) if !units::height_in_range(h, system) => {
                let (lo, hi) = units::height_bounds(system);
                errors.insert(
                    ProfileField::Height,
                    format!(
                        "Height must be between {}-{} {}",
                        lo,
                        hi,
                        system.height_unit()
                    ),
                );
            }
            Some(_) => {}
        }

        match parse_positive(&form.weight) {
            None => {
                errors.insert(ProfileField::Weight, "Weight is required".to_string());
            }
            Some(w) if !units::weight_in_range(w, system) => {
                let (lo, hi) = units::weight_bounds(system);
                errors.insert(
                    ProfileField::Weight,
                    format!(
                        "Weight must be between {}-{} {}",
                        lo,
                        hi,
                        system.weight_unit()
                    ),
                );
            }
            Some(_) => {}
        }

        let age = form.age.trim();
        if !age.is_empty() {
            let ok = age
                .parse::<i64>()
                .map(|a| units::AGE_YEARS.contains(&a))
                .unwrap_or(false);
            if !ok {
                errors.insert(
                    ProfileField::Age,
                    format!(
                        "Age must be between {}-{} years",
                        units::AGE_YEARS.start(),
                        units::AGE_YEARS.end()
                    ),
                );
            }
        }

        if !units::WEEKLY_FREQUENCY.contains(&i64::from(form.weekly_frequency)) {
            errors.insert(
                ProfileField::WeeklyFrequency,
                format!(
                    "Weekly frequency must be between {}-{}",
                    units::WEEKLY_FREQUENCY.start(),
                    units::WEEKLY_FREQUENCY.end()
                ),
            );
        }

        if form.sex.is_none() {
            errors.insert(ProfileField::Sex, "Please select sex".to_string());
        }
        if form.experience_level.is_none() {
            errors.insert(
                ProfileField::ExperienceLevel,
                "Please select an experience level".to_string(),
            );
        }
        if form.primary_goal.is_none() {
            errors.insert(
                ProfileField::PrimaryGoal,
                "Please select a primary goal".to_string(),
            );
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Canonical metric record for the current form.
    fn to_record(&self, person: PersonId) -> Result<ProfileRecord> {
        let form = &self.form;
        let missing = |what: &str| Error::InvalidChoice(format!("{} is missing", what));

        let height = parse_positive(&form.height).ok_or_else(|| missing("height"))?;
        let weight = parse_positive(&form.weight).ok_or_else(|| missing("weight"))?;
        let age = match form.age.trim() {
            "" => None,
            text => Some(
                text.parse::<u8>()
                    .map_err(|_| Error::InvalidChoice(format!("bad age: {}", text)))?,
            ),
        };

        Ok(ProfileRecord {
            person_id: person,
            height: units::height_to_cm(height, form.unit_system),
            weight: units::weight_to_kg(weight, form.unit_system),
            sex: form.sex.ok_or_else(|| missing("sex"))?,
            age,
            unit_system: form.unit_system,
            experience_level: form
                .experience_level
                .ok_or_else(|| missing("experience level"))?,
            primary_goal: form.primary_goal.ok_or_else(|| missing("primary goal"))?,
            weekly_frequency: form.weekly_frequency,
        })
    }

    /// Validate and persist the form in metric units.
    ///
    /// Creates the record if none existed, otherwise updates it. On success
    /// the change-detection snapshot becomes the saved form. Failures leave
    /// the form and snapshot untouched.
    pub async fn save(&mut self, person: PersonId, store: &dyn ProfileStore) -> Result<SaveOutcome> {
        if self.saving {
            return Err(Error::Busy);
        }
        if !self.validate() {
            tracing::debug!("Profile has {} field errors, not saving", self.errors.len());
            return Ok(SaveOutcome::Invalid);
        }

        let record = self.to_record(person)?;

        self.saving = true;
        let result = if self.exists {
            store.update_profile(person, &record).await
        } else {
            store.create_profile(&record).await
        };
        self.saving = false;

        match result {
            Ok(()) => {
                let outcome = if self.exists {
                    SaveOutcome::Updated
                } else {
                    SaveOutcome::Created
                };
                self.original = Some(self.form.clone());
                self.exists = true;
                tracing::info!("Saved profile for {} ({:?})", person, outcome);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!("Failed to save profile for {}: {}", person, e);
                Err(Error::persistence(&e))
            }
        }
    }

    /// True when the form differs from the last loaded or saved version,
    /// or when nothing has been loaded or saved yet.
    pub fn has_changes(&self) -> bool {
        self.original.as_ref() != Some(&self.form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        record: Mutex<Option<ProfileRecord>>,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl MemoryStore {
        fn with(record: ProfileRecord) -> Self {
            Self {
                record: Mutex::new(Some(record)),
                ..Self::default()
            }
        }

        fn stored(&self) -> Option<ProfileRecord> {
            self.record.lock().unwrap().clone()
        }

        fn write(&self, record: &ProfileRecord) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "store down",
                )));
            }
            *self.record.lock().unwrap() = Some(record.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryStore {
        async fn fetch_profile(&self, _person: PersonId) -> Result<Option<ProfileRecord>> {
            Ok(self.stored())
        }

        async fn create_profile(&self, record: &ProfileRecord) -> Result<()> {
            assert!(self.stored().is_none(), "create on existing profile");
            self.write(record)
        }

        async fn update_profile(&self, _person: PersonId, record: &ProfileRecord) -> Result<()> {
            assert!(self.stored().is_some(), "update on missing profile");
            self.write(record)
        }
    }

    fn stored_imperial() -> ProfileRecord {
        ProfileRecord {
            person_id: PersonId(9),
            height: 177.8,
            weight: 90.7184,
            sex: Sex::Male,
            age: Some(34),
            unit_system: UnitSystem::Imperial,
            experience_level: ExperienceLevel::Advanced,
            primary_goal: PrimaryGoal::Cut,
            weekly_frequency: 5,
        }
    }

    fn filled_editor() -> ProfileEditor {
        let mut editor = ProfileEditor::new();
        editor.set_field(FieldValue::Height("175".into()));
        editor.set_field(FieldValue::Weight("70".into()));
        editor.set_field(FieldValue::Sex(Some(Sex::PreferNotToSay)));
        editor.set_field(FieldValue::Age("28".into()));
        editor.set_field(FieldValue::ExperienceLevel(Some(ExperienceLevel::Beginner)));
        editor.set_field(FieldValue::PrimaryGoal(Some(PrimaryGoal::Bulk)));
        editor.set_field(FieldValue::WeeklyFrequency(3));
        editor
    }

    #[tokio::test]
    async fn test_load_missing_profile_keeps_defaults() {
        let store = MemoryStore::default();
        let mut editor = ProfileEditor::new();

        assert!(!editor.load(PersonId(1), &store).await.unwrap());
        assert_eq!(editor.form(), &ProfileForm::default());
        assert!(editor.errors().is_empty());
        assert!(!editor.exists());
        assert!(editor.has_changes());
    }

    #[tokio::test]
    async fn test_load_missing_after_existing_resets_form() {
        let store = MemoryStore::with(stored_imperial());
        let mut editor = ProfileEditor::new();
        assert!(editor.load(PersonId(9), &store).await.unwrap());
        editor.set_field(FieldValue::Height("abc".into()));
        assert!(!editor.validate());

        let empty = MemoryStore::default();
        assert!(!editor.load(PersonId(2), &empty).await.unwrap());

        assert_eq!(editor.form(), &ProfileForm::default());
        assert!(editor.errors().is_empty());
        assert!(!editor.exists());
        assert!(editor.has_changes());

        assert_eq!(
            editor.save(PersonId(2), &empty).await.unwrap(),
            SaveOutcome::Invalid
        );
        assert!(empty.stored().is_none());
    }

    #[tokio::test]
    async fn test_load_converts_to_stored_unit_system() {
        let store = MemoryStore::with(stored_imperial());
        let mut editor = ProfileEditor::new();

        assert!(editor.load(PersonId(9), &store).await.unwrap());

        let form = editor.form();
        assert_eq!(form.unit_system, UnitSystem::Imperial);
        let inches: f64 = form.height.parse().unwrap();
        let pounds: f64 = form.weight.parse().unwrap();
        assert!((inches - 70.0).abs() < 1e-9);
        assert!((pounds - 200.0).abs() < 1e-9);
        assert_eq!(form.age, "34");
        assert!(!editor.has_changes());
    }

    #[test]
    fn test_valid_metric_form() {
        let mut editor = filled_editor();
        assert!(editor.validate());
        assert!(editor.errors().is_empty());
    }

    #[test]
    fn test_unit_switch_does_not_convert() {
        let mut editor = filled_editor();
        assert!(editor.validate());

        editor.set_unit_system(UnitSystem::Imperial);
        assert_eq!(editor.form().height, "175");
        assert!(!editor.validate());
        assert_eq!(
            editor.error(ProfileField::Height),
            Some("Height must be between 39-98 inches")
        );
        // 70 lb is 31.8 kg, still inside the window
        assert_eq!(editor.error(ProfileField::Weight), None);
    }

    #[test]
    fn test_required_and_range_errors() {
        let mut editor = ProfileEditor::new();
        editor.set_field(FieldValue::Weight("-5".into()));
        editor.set_field(FieldValue::Age("9".into()));
        editor.set_field(FieldValue::WeeklyFrequency(8));

        assert!(!editor.validate());
        assert_eq!(editor.error(ProfileField::Height), Some("Height is required"));
        assert_eq!(editor.error(ProfileField::Weight), Some("Weight is required"));
        assert_eq!(
            editor.error(ProfileField::Age),
            Some("Age must be between 10-100 years")
        );
        assert_eq!(
            editor.error(ProfileField::WeeklyFrequency),
            Some("Weekly frequency must be between 1-7")
        );
        assert!(editor.error(ProfileField::Sex).is_some());
        assert!(editor.error(ProfileField::ExperienceLevel).is_some());
        assert!(editor.error(ProfileField::PrimaryGoal).is_some());
    }

    #[test]
    fn test_metric_bounds() {
        let mut editor = filled_editor();
        editor.set_field(FieldValue::Height("99.5".into()));
        editor.set_field(FieldValue::Weight("251".into()));
        assert!(!editor.validate());
        assert_eq!(
            editor.error(ProfileField::Height),
            Some("Height must be between 100-250 cm")
        );
        assert_eq!(
            editor.error(ProfileField::Weight),
            Some("Weight must be between 30-250 kg")
        );
    }

    #[test]
    fn test_imperial_weight_bound_message() {
        let mut editor = filled_editor();
        editor.set_unit_system(UnitSystem::Imperial);
        editor.set_field(FieldValue::Height("70".into()));
        editor.set_field(FieldValue::Weight("600".into()));
        assert!(!editor.validate());
        assert_eq!(
            editor.error(ProfileField::Weight),
            Some("Weight must be between 66-551 lb")
        );
    }

    #[test]
    fn test_age_is_optional() {
        let mut editor = filled_editor();
        editor.set_field(FieldValue::Age(String::new()));
        assert!(editor.validate());

        editor.set_field(FieldValue::Age("abc".into()));
        assert!(!editor.validate());
    }

    #[test]
    fn test_set_field_clears_its_error() {
        let mut editor = ProfileEditor::new();
        assert!(!editor.validate());
        assert!(editor.error(ProfileField::Height).is_some());

        editor.set_field(FieldValue::Height("180".into()));
        assert!(editor.error(ProfileField::Height).is_none());
        assert!(editor.error(ProfileField::Weight).is_some());
    }

    #[tokio::test]
    async fn test_invalid_save_makes_no_call() {
        let store = MemoryStore::default();
        let mut editor = ProfileEditor::new();

        let outcome = editor.save(PersonId(1), &store).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Invalid);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_save_creates_then_updates() {
        let store = MemoryStore::default();
        let mut editor = filled_editor();
        assert!(!editor.load(PersonId(3), &store).await.unwrap());

        assert_eq!(
            editor.save(PersonId(3), &store).await.unwrap(),
            SaveOutcome::Created
        );
        assert!(!editor.has_changes());

        editor.set_field(FieldValue::WeeklyFrequency(4));
        assert!(editor.has_changes());
        assert_eq!(
            editor.save(PersonId(3), &store).await.unwrap(),
            SaveOutcome::Updated
        );
        assert_eq!(store.stored().unwrap().weekly_frequency, 4);
    }

    #[tokio::test]
    async fn test_save_persists_metric() {
        let store = MemoryStore::default();
        let mut editor = filled_editor();
        editor.set_unit_system(UnitSystem::Imperial);
        editor.set_field(FieldValue::Height("70".into()));
        editor.set_field(FieldValue::Weight("200".into()));

        editor.save(PersonId(3), &store).await.unwrap();

        let saved = store.stored().unwrap();
        assert!((saved.height - 177.8).abs() < 1e-9);
        assert!((saved.weight - 90.7184).abs() < 1e-9);
        assert_eq!(saved.unit_system, UnitSystem::Imperial);
        assert_eq!(saved.age, Some(28));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_snapshot() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let mut editor = filled_editor();

        let err = editor.save(PersonId(3), &store).await.unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::PersistenceFailed);
        assert!(editor.has_changes());
        assert!(!editor.exists());
        assert!(!editor.is_saving());
    }

    #[tokio::test]
    async fn test_reload_after_save_matches() {
        let store = MemoryStore::default();
        let mut editor = filled_editor();
        editor.save(PersonId(3), &store).await.unwrap();

        let mut fresh = ProfileEditor::new();
        fresh.load(PersonId(3), &store).await.unwrap();
        assert_eq!(fresh.form(), editor.form());
    }
}
