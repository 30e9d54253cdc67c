//! Built-in exercise catalog.
//!
//! This module provides the stock exercise names for each body part, the
//! same lists the remote service offers from its `/exercises` endpoint.

use crate::store::ExerciseCatalog;
use crate::types::{BodyPart, ExercisesResponse};
use crate::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<BTreeMap<BodyPart, Vec<String>>> =
    Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static BTreeMap<BodyPart, Vec<String>> {
    &DEFAULT_CATALOG
}

/// Stock exercise names for one body part
pub fn exercises_for(part: BodyPart) -> &'static [String] {
    DEFAULT_CATALOG
        .get(&part)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| (*name).to_string()).collect()
}

fn build_default_catalog_internal() -> BTreeMap<BodyPart, Vec<String>> {
    let mut catalog = BTreeMap::new();

    catalog.insert(
        BodyPart::Back,
        names(&[
            "Lat Pulldown",
            "Barbell Row",
            "Dumbbell Row",
            "Cable Row",
            "Pull-up",
            "T-Bar Row",
            "One-Arm Dumbbell Row",
            "Seated Cable Row",
        ]),
    );

    catalog.insert(
        BodyPart::Chest,
        names(&[
            "Bench Press",
            "Incline Bench Press",
            "Dumbbell Press",
            "Incline Dumbbell Press",
            "Dips",
            "Push-up",
            "Cable Fly",
            "Dumbbell Fly",
            "Pec Deck Fly",
            "Chest Press Machine",
        ]),
    );

    catalog.insert(
        BodyPart::Legs,
        names(&[
            "Squat",
            "Leg Press",
            "Leg Extension",
            "Leg Curl",
            "Lunge",
            "Calf Raise",
        ]),
    );

    catalog.insert(
        BodyPart::Shoulders,
        names(&[
            "Overhead Press",
            "Dumbbell Shoulder Press",
            "Side Lateral Raise",
            "Front Raise",
            "Rear Delt Fly",
            "Face Pull",
            "Upright Row",
        ]),
    );

    catalog.insert(
        BodyPart::Biceps,
        names(&["Barbell Curl", "Dumbbell Curl", "Hammer Curl", "Cable Curl"]),
    );

    // "Dips" is listed under chest as well
    catalog.insert(
        BodyPart::Triceps,
        names(&[
            "Triceps Extension",
            "Overhead Triceps Extension",
            "Dips",
            "Close Grip Bench Press",
        ]),
    );

    catalog
}

/// Catalog collaborator backed by the built-in lists
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCatalog;

#[async_trait]
impl ExerciseCatalog for BuiltinCatalog {
    async fn fetch_exercises(&self, body_part: BodyPart) -> Result<ExercisesResponse> {
        Ok(ExercisesResponse::ForBodyPart {
            body_part: Some(body_part),
            exercises: exercises_for(body_part).to_vec(),
            allow_custom: true,
        })
    }
}
