//! Remote record store over HTTP.
//!
//! Talks to the SmartFit REST service:
//! - `GET  /exercises?body_part=<part>`
//! - `POST /event-logs`
//! - `POST /user-metrics`
//! - `GET  /user-profiles/{id}` (404 means no profile yet)
//! - `POST /user-profiles`, `PUT /user-profiles/{id}`

use crate::store::{ExerciseCatalog, ProfileStore, SetRecordSink, UserMetricSink};
use crate::types::{
    BodyPart, ExercisesResponse, PersonId, ProfileRecord, SetRecord, UserMetricRecord,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ExerciseCatalog for HttpStore {
    async fn fetch_exercises(&self, body_part: BodyPart) -> Result<ExercisesResponse> {
        let response = self
            .client
            .get(self.url("/exercises"))
            .query(&[("body_part", body_part.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SetRecordSink for HttpStore {
    async fn create_set_record(&self, record: &SetRecord) -> Result<()> {
        self.client
            .post(self.url("/event-logs"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(
            "Posted set {} of {}",
            record.set_number,
            record.exercise_name
        );
        Ok(())
    }
}

#[async_trait]
impl UserMetricSink for HttpStore {
    async fn create_user_metric(&self, record: &UserMetricRecord) -> Result<()> {
        self.client
            .post(self.url("/user-metrics"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("Posted check-in for {}", record.person_id);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for HttpStore {
    async fn fetch_profile(&self, person: PersonId) -> Result<Option<ProfileRecord>> {
        let response = self
            .client
            .get(self.url(&format!("/user-profiles/{}", person)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = response.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    async fn create_profile(&self, record: &ProfileRecord) -> Result<()> {
        self.client
            .post(self.url("/user-profiles"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn update_profile(&self, person: PersonId, record: &ProfileRecord) -> Result<()> {
        self.client
            .put(self.url(&format!("/user-profiles/{}", person)))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExperienceLevel, PrimaryGoal, Sex};
    use crate::units::UnitSystem;
    use crate::ErrorKind;
    use mockito::Matcher;
    use serde_json::json;

    fn store(server: &mockito::Server) -> HttpStore {
        HttpStore::new(format!("{}/", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_exercises() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/exercises")
            .match_query(Matcher::UrlEncoded("body_part".into(), "back".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"body_part":"back","exercises":["Pull-up","Cable Row"],"allow_custom":true}"#)
            .create_async()
            .await;

        let response = store(&server)
            .fetch_exercises(BodyPart::Back)
            .await
            .unwrap();

        assert_eq!(
            response.suggestions_for(BodyPart::Back),
            vec!["Pull-up", "Cable Row"]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_set_record_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/event-logs")
            .match_body(Matcher::PartialJson(json!({
                "user_id": 4,
                "exercise_name": "Squat",
                "set_number": 2,
                "reps": 5,
                "completed": true
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let record = SetRecord {
            person_id: PersonId(4),
            exercise_name: "Squat".into(),
            set_number: 2,
            reps: 5,
            weight: 120.0,
            rating: None,
            completed: true,
        };
        store(&server).create_set_record(&record).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_persistence_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/event-logs")
            .with_status(500)
            .create_async()
            .await;

        let record = SetRecord {
            person_id: PersonId(4),
            exercise_name: "Squat".into(),
            set_number: 1,
            reps: 5,
            weight: 120.0,
            rating: None,
            completed: true,
        };
        let err = store(&server).create_set_record(&record).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailed);
    }

    #[tokio::test]
    async fn test_create_user_metric_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user-metrics")
            .match_body(Matcher::PartialJson(json!({
                "user_id": 2,
                "energy_level": 9,
                "available_time": 30,
                "target_workout": ["chest", "triceps"]
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let record = UserMetricRecord {
            person_id: PersonId(2),
            date: chrono::Utc::now(),
            sleep_hours: Some(8.0),
            energy_level: Some(9),
            available_time: Some(30),
            target_workout: Some(vec![BodyPart::Chest, BodyPart::Triceps]),
            notes: None,
        };
        store(&server).create_user_metric(&record).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user-profiles/5")
            .with_status(404)
            .with_body(r#"{"detail":"User profile not found"}"#)
            .create_async()
            .await;

        assert!(store(&server)
            .fetch_profile(PersonId(5))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_fetch_profile_ignores_server_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user-profiles/5")
            .with_status(200)
            .with_body(
                r#"{"id":1,"user_id":5,"height":180.0,"weight":75.5,"sex":"female","age":41,
                    "unit_system":"metric","experience_level":"beginner","primary_goal":"weight_loss",
                    "weekly_frequency":2,"created_at":"2024-01-01T00:00:00","updated_at":null}"#,
            )
            .create_async()
            .await;

        let record = store(&server)
            .fetch_profile(PersonId(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.sex, Sex::Female);
        assert_eq!(record.primary_goal, PrimaryGoal::WeightLoss);
        assert_eq!(record.age, Some(41));
    }

    #[tokio::test]
    async fn test_update_profile_puts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/user-profiles/8")
            .match_body(Matcher::PartialJson(json!({"unit_system": "imperial"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let record = ProfileRecord {
            person_id: PersonId(8),
            height: 170.0,
            weight: 65.0,
            sex: Sex::Male,
            age: None,
            unit_system: UnitSystem::Imperial,
            experience_level: ExperienceLevel::Intermediate,
            primary_goal: PrimaryGoal::Bulk,
            weekly_frequency: 3,
        };
        store(&server)
            .update_profile(PersonId(8), &record)
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
