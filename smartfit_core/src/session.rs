//! Session builder: the editable exercise → set tree for one workout.
//!
//! Exercises live in a flat arena addressed by session-local ids, each
//! owning its ordered sets. Every exercise always has at least one set.
//! At most one rating popover is open at a time and its key is part of
//! the builder state.

use crate::store::{ExerciseCatalog, SetRecordSink};
use crate::types::{
    BodyPart, Exercise, ExerciseId, PersonId, Rating, Set, SetId, SetRecord, SetUpdate,
};
use crate::{Error, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;

/// Key of one set's rating popover
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RatingPopoverKey {
    pub exercise: ExerciseId,
    pub set: SetId,
}

impl RatingPopoverKey {
    pub fn new(exercise: ExerciseId, set: SetId) -> Self {
        Self { exercise, set }
    }
}

impl fmt::Display for RatingPopoverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-rpe", self.exercise, self.set)
    }
}

/// Exercise name chosen but not yet added
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingSelection {
    pub selected: String,
    pub custom_name: String,
    pub use_custom: bool,
}

/// Totals shown above the exercise list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSummary {
    pub exercises: usize,
    pub sets: usize,
    pub by_body_part: BTreeMap<BodyPart, usize>,
}

#[derive(Debug, Default)]
pub struct SessionBuilder {
    exercises: Vec<Exercise>,
    active_body_part: Option<BodyPart>,
    suggestions: Vec<String>,
    pending: PendingSelection,
    open_popover: Option<RatingPopoverKey>,
    submitting: bool,
    next_id: u32,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|ex| ex.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn active_body_part(&self) -> Option<BodyPart> {
        self.active_body_part
    }

    /// Exercise names offered for the active body part
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn pending(&self) -> &PendingSelection {
        &self.pending
    }

    pub fn open_rating_popover(&self) -> Option<RatingPopoverKey> {
        self.open_popover
    }

    /// True while a submit is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn next_exercise_id(&mut self) -> ExerciseId {
        self.next_id += 1;
        ExerciseId(self.next_id)
    }

    fn next_set_id(&mut self) -> SetId {
        self.next_id += 1;
        SetId(self.next_id)
    }

    fn exercise_mut(&mut self, id: ExerciseId) -> Result<&mut Exercise> {
        self.exercises
            .iter_mut()
            .find(|ex| ex.id == id)
            .ok_or(Error::UnknownExercise(id))
    }

    fn set_mut(&mut self, exercise: ExerciseId, set: SetId) -> Result<&mut Set> {
        self.exercise_mut(exercise)?
            .sets
            .iter_mut()
            .find(|s| s.id == set)
            .ok_or(Error::UnknownSet { exercise, set })
    }

    // ------------------------------------------------------------------
    // Exercise selection
    // ------------------------------------------------------------------

    /// Make `part` the active body part and load its suggestions.
    ///
    /// The pending selection is cleared. If the catalog cannot be reached
    /// the suggestion list is left empty and `CatalogUnavailable` is
    /// returned; the builder stays usable for custom entries.
    pub async fn select_body_part(
        &mut self,
        part: BodyPart,
        catalog: &dyn ExerciseCatalog,
    ) -> Result<usize> {
        self.active_body_part = Some(part);
        self.pending = PendingSelection::default();
        self.suggestions.clear();

        match catalog.fetch_exercises(part).await {
            Ok(response) => {
                self.suggestions = response.suggestions_for(part);
                tracing::debug!("{} suggestions for {}", self.suggestions.len(), part);
                Ok(self.suggestions.len())
            }
            Err(e) => {
                tracing::warn!("Failed to load exercises for {}: {}", part, e);
                Err(Error::CatalogUnavailable(e.to_string()))
            }
        }
    }

    pub fn select_exercise(&mut self, name: impl Into<String>) {
        self.pending.selected = name.into();
    }

    pub fn set_custom_name(&mut self, name: impl Into<String>) {
        self.pending.custom_name = name.into();
    }

    pub fn use_custom_entry(&mut self, use_custom: bool) {
        self.pending.use_custom = use_custom;
    }

    /// Add the pending selection under the active body part.
    pub fn add_pending_exercise(&mut self) -> Result<ExerciseId> {
        let (name, custom) = if self.pending.use_custom {
            (self.pending.custom_name.clone(), true)
        } else {
            (self.pending.selected.clone(), false)
        };
        self.add_exercise(&name, self.active_body_part, custom)
    }

    /// Append an exercise with one empty set.
    ///
    /// Custom names are trimmed. Rejected when no body part is given, the
    /// name is blank, or the same name is already logged for that body part.
    pub fn add_exercise(
        &mut self,
        name: &str,
        body_part: Option<BodyPart>,
        is_custom: bool,
    ) -> Result<ExerciseId> {
        let body_part = body_part.ok_or_else(|| {
            tracing::warn!("Rejected exercise {:?}: no body part selected", name);
            Error::NoBodyPart
        })?;

        let name = if is_custom { name.trim() } else { name };
        if name.trim().is_empty() {
            tracing::warn!("Rejected exercise: empty name");
            return Err(Error::EmptyExerciseName);
        }

        if self
            .exercises
            .iter()
            .any(|ex| ex.name == name && ex.body_part == body_part)
        {
            tracing::warn!("Rejected duplicate exercise {} ({})", name, body_part);
            return Err(Error::DuplicateExercise {
                name: name.to_string(),
                body_part,
            });
        }

        let id = self.next_exercise_id();
        let first_set = Set::empty(self.next_set_id());
        self.exercises.push(Exercise {
            id,
            name: name.to_string(),
            body_part,
            sets: vec![first_set],
        });
        self.pending = PendingSelection::default();

        tracing::debug!(
            "Added {}exercise {} ({}) as {}",
            if is_custom { "custom " } else { "" },
            name,
            body_part,
            id
        );
        Ok(id)
    }

    /// Remove an exercise together with all of its sets.
    pub fn remove_exercise(&mut self, id: ExerciseId) -> Result<Exercise> {
        let index = self
            .exercises
            .iter()
            .position(|ex| ex.id == id)
            .ok_or(Error::UnknownExercise(id))?;

        if self.open_popover.map(|key| key.exercise) == Some(id) {
            self.open_popover = None;
        }
        Ok(self.exercises.remove(index))
    }

    // ------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------

    /// Append an empty set to the exercise.
    pub fn add_set(&mut self, exercise: ExerciseId) -> Result<SetId> {
        // Resolve first so an unknown id does not burn a set id
        self.exercise_mut(exercise)?;
        let set_id = self.next_set_id();
        self.exercise_mut(exercise)?.sets.push(Set::empty(set_id));
        Ok(set_id)
    }

    /// Remove a set. Removing the only set leaves a fresh empty one.
    pub fn remove_set(&mut self, exercise: ExerciseId, set: SetId) -> Result<()> {
        let index = self
            .exercise_mut(exercise)?
            .sets
            .iter()
            .position(|s| s.id == set)
            .ok_or(Error::UnknownSet { exercise, set })?;

        let ex = self.exercise_mut(exercise)?;
        ex.sets.remove(index);
        if ex.sets.is_empty() {
            let replacement = self.next_set_id();
            self.exercise_mut(exercise)?.sets.push(Set::empty(replacement));
        }

        if self.open_popover == Some(RatingPopoverKey::new(exercise, set)) {
            self.open_popover = None;
        }
        Ok(())
    }

    /// Change one field of a set.
    pub fn update_set(&mut self, exercise: ExerciseId, set: SetId, update: SetUpdate) -> Result<()> {
        let target = self.set_mut(exercise, set)?;
        match update {
            SetUpdate::Reps(reps) => target.reps = reps,
            SetUpdate::Weight(weight) => {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(Error::InvalidWeight(weight));
                }
                target.weight = weight;
            }
            SetUpdate::Rating(None) => target.rating = None,
            SetUpdate::Rating(Some(value)) => target.rating = Some(Rating::try_from(value)?),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rating popover
    // ------------------------------------------------------------------

    /// Pick a rating from the open popover and close it.
    pub fn select_rating(&mut self, exercise: ExerciseId, set: SetId, value: u8) -> Result<()> {
        self.update_set(exercise, set, SetUpdate::Rating(Some(value)))?;
        self.open_popover = None;
        Ok(())
    }

    /// Clear a set's rating from the open popover and close it.
    pub fn clear_rating(&mut self, exercise: ExerciseId, set: SetId) -> Result<()> {
        self.update_set(exercise, set, SetUpdate::Rating(None))?;
        self.open_popover = None;
        Ok(())
    }

    /// Open `key`'s popover, or close it if it is already the open one.
    pub fn toggle_rating_popover(&mut self, key: RatingPopoverKey) {
        self.open_popover = if self.open_popover == Some(key) {
            None
        } else {
            Some(key)
        };
    }

    /// An interaction happened; `inside` is the popover it landed in, if any.
    ///
    /// Anything that does not land inside the open popover closes it.
    pub fn dismiss_rating_popover(&mut self, inside: Option<RatingPopoverKey>) {
        if let Some(open) = self.open_popover {
            if inside != Some(open) {
                self.open_popover = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Check the session is ready to submit.
    pub fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::NothingToLog);
        }

        match self
            .exercises
            .iter()
            .find(|ex| ex.sets.iter().any(|s| !s.is_complete()))
        {
            Some(ex) => Err(Error::IncompleteSets {
                exercise: ex.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// One record per set, in exercise order.
    pub fn flatten(&self, person: PersonId) -> Vec<SetRecord> {
        self.exercises
            .iter()
            .flat_map(|ex| {
                ex.sets.iter().zip(1u32..).map(move |(set, set_number)| SetRecord {
                    person_id: person,
                    exercise_name: ex.name.clone(),
                    set_number,
                    reps: set.reps,
                    weight: set.weight,
                    rating: set.rating,
                    completed: true,
                })
            })
            .collect()
    }

    /// Validate, then send every set to `sink` concurrently.
    ///
    /// All writes are awaited. If any fails the session is left untouched
    /// and a `Persistence` error reports how many failed; otherwise the
    /// session is reset and the number of records written is returned.
    pub async fn submit(&mut self, person: PersonId, sink: &dyn SetRecordSink) -> Result<usize> {
        if self.submitting {
            return Err(Error::Busy);
        }
        if let Err(e) = self.validate() {
            tracing::warn!("Submit rejected: {}", e);
            return Err(e);
        }

        let records = self.flatten(person);
        let total = records.len();

        self.submitting = true;
        let outcomes = join_all(records.iter().map(|record| sink.create_set_record(record))).await;
        self.submitting = false;

        let failures: Vec<Error> = outcomes.into_iter().filter_map(|o| o.err()).collect();
        if let Some(first) = failures.first() {
            tracing::warn!(
                "{} of {} set records failed to save: {}",
                failures.len(),
                total,
                first
            );
            return Err(Error::Persistence {
                failed: failures.len(),
                total,
                message: first.to_string(),
            });
        }

        tracing::info!("Logged {} sets across {} exercises", total, self.exercises.len());
        self.reset();
        Ok(total)
    }

    /// Drop every exercise and all selection state.
    pub fn reset(&mut self) {
        self.exercises.clear();
        self.active_body_part = None;
        self.suggestions.clear();
        self.pending = PendingSelection::default();
        self.open_popover = None;
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            exercises: self.exercises.len(),
            ..SessionSummary::default()
        };
        for ex in &self.exercises {
            summary.sets += ex.sets.len();
            *summary.by_body_part.entry(ex.body_part).or_insert(0) += 1;
        }
        summary
    }
}
