//! Core domain types for SmartFit.
//!
//! This module defines the fundamental types used throughout the system:
//! - Body parts, exercises and sets of the session editor
//! - The flat set records sent to the record store
//! - Profile enumerations and the canonical profile record

use crate::units::UnitSystem;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Stable key for a person, supplied by the authentication layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Body Parts
// ============================================================================

/// Body part an exercise targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Back,
    Chest,
    Legs,
    Shoulders,
    Biceps,
    Triceps,
}

impl BodyPart {
    pub const ALL: [BodyPart; 6] = [
        BodyPart::Back,
        BodyPart::Chest,
        BodyPart::Legs,
        BodyPart::Shoulders,
        BodyPart::Biceps,
        BodyPart::Triceps,
    ];

    /// Wire tag (`"back"`, `"chest"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Back => "back",
            BodyPart::Chest => "chest",
            BodyPart::Legs => "legs",
            BodyPart::Shoulders => "shoulders",
            BodyPart::Biceps => "biceps",
            BodyPart::Triceps => "triceps",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            BodyPart::Back => "Back",
            BodyPart::Chest => "Chest",
            BodyPart::Legs => "Legs",
            BodyPart::Shoulders => "Shoulders",
            BodyPart::Biceps => "Biceps",
            BodyPart::Triceps => "Triceps",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyPart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        BodyPart::ALL
            .into_iter()
            .find(|part| part.as_str() == wanted)
            .ok_or_else(|| Error::UnknownBodyPart(s.to_string()))
    }
}

// ============================================================================
// Session Editing Types
// ============================================================================

/// Session-local identifier of an exercise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExerciseId(pub(crate) u32);

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ex{}", self.0)
    }
}

/// Session-local identifier of a set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetId(pub(crate) u32);

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set{}", self.0)
    }
}

/// Perceived effort (RPE) on the 6-10 scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 6;
    pub const MAX: u8 = 10;

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every selectable rating, lowest first
    pub fn choices() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(Error::InvalidRating(value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One block of repetitions within an exercise
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    pub id: SetId,
    pub reps: u32,
    pub weight: f64,
    pub rating: Option<Rating>,
}

impl Set {
    pub(crate) fn empty(id: SetId) -> Self {
        Self {
            id,
            reps: 0,
            weight: 0.0,
            rating: None,
        }
    }

    /// Both reps and weight have been filled in
    pub fn is_complete(&self) -> bool {
        self.reps > 0 && self.weight > 0.0
    }
}

/// A named movement in the session being edited
#[derive(Clone, Debug, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub body_part: BodyPart,
    pub sets: Vec<Set>,
}

/// A single field change on a set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetUpdate {
    Reps(u32),
    Weight(f64),
    /// `None` clears the rating
    Rating(Option<u8>),
}

// ============================================================================
// Record Store Types
// ============================================================================

/// Flat, submit-ready record for one performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    #[serde(rename = "user_id")]
    pub person_id: PersonId,
    pub exercise_name: String,
    /// 1-based position within its exercise
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    #[serde(rename = "rpe", default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub completed: bool,
}

/// A set record as kept by the local set log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedSet {
    pub id: Uuid,
    pub logged_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: SetRecord,
}

/// Exercise list as served by the catalog endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExercisesResponse {
    ForBodyPart {
        #[serde(default)]
        body_part: Option<BodyPart>,
        exercises: Vec<String>,
        #[serde(default = "allow_custom_default")]
        allow_custom: bool,
    },
    ByBodyPart {
        exercises_by_body_part: BTreeMap<BodyPart, Vec<String>>,
        #[serde(default = "allow_custom_default")]
        allow_custom: bool,
    },
}

fn allow_custom_default() -> bool {
    true
}

impl ExercisesResponse {
    /// Suggestions usable for `part`; empty when the response carries none.
    pub fn suggestions_for(&self, part: BodyPart) -> Vec<String> {
        match self {
            ExercisesResponse::ForBodyPart { exercises, .. } => exercises.clone(),
            ExercisesResponse::ByBodyPart {
                exercises_by_body_part,
                ..
            } => exercises_by_body_part
                .get(&part)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// Daily Check-in Types
// ============================================================================

/// One day's condition check-in
///
/// Everything except the person and timestamp is optional; an empty
/// target list is sent as absent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserMetricRecord {
    #[serde(rename = "user_id")]
    pub person_id: PersonId,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<u8>,
    /// Minutes available for training
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_workout: Option<Vec<BodyPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A check-in as kept by the local check-in log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedUserMetric {
    pub id: Uuid,
    pub logged_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: UserMetricRecord,
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    PreferNotToSay,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    Bulk,
    Cut,
    LeanMass,
    WeightLoss,
}

/// Canonical profile as persisted; height in cm, weight in kg.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileRecord {
    #[serde(rename = "user_id")]
    pub person_id: PersonId,
    pub height: f64,
    pub weight: f64,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default)]
    pub unit_system: UnitSystem,
    pub experience_level: ExperienceLevel,
    pub primary_goal: PrimaryGoal,
    pub weekly_frequency: u8,
}

macro_rules! snake_case_from_str {
    ($ty:ident, $($variant:ident => $tag:literal),+ $(,)?) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().replace('-', "_").as_str() {
                    $($tag => Ok($ty::$variant),)+
                    other => Err(Error::InvalidChoice(format!(
                        "unknown {}: {}",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

snake_case_from_str!(Sex, Male => "male", Female => "female", PreferNotToSay => "prefer_not_to_say");
snake_case_from_str!(
    ExperienceLevel,
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
);
snake_case_from_str!(
    PrimaryGoal,
    Bulk => "bulk",
    Cut => "cut",
    LeanMass => "lean_mass",
    WeightLoss => "weight_loss",
);
