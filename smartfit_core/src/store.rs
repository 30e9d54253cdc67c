//! Collaborator contracts for the record store and exercise catalog.
//!
//! The session builder, profile editor and check-in form only ever talk to
//! these traits. Local file-backed implementations live in `record_log`
//! and `profile_store`; the remote one in `http`.

use crate::types::{
    BodyPart, ExercisesResponse, PersonId, ProfileRecord, SetRecord, UserMetricRecord,
};
use crate::Result;
use async_trait::async_trait;

/// Source of exercise name suggestions
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    async fn fetch_exercises(&self, body_part: BodyPart) -> Result<ExercisesResponse>;
}

/// Sink accepting one set record per call
#[async_trait]
pub trait SetRecordSink: Send + Sync {
    async fn create_set_record(&self, record: &SetRecord) -> Result<()>;
}

/// Remote profile resource
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the person has no profile yet
    async fn fetch_profile(&self, person: PersonId) -> Result<Option<ProfileRecord>>;

    async fn create_profile(&self, record: &ProfileRecord) -> Result<()>;

    async fn update_profile(&self, person: PersonId, record: &ProfileRecord) -> Result<()>;
}

/// Sink accepting daily check-ins
#[async_trait]
pub trait UserMetricSink: Send + Sync {
    async fn create_user_metric(&self, record: &UserMetricRecord) -> Result<()>;
}
