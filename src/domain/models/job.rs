use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub rsvp_id: String,
    pub event_id: String,
    pub member_id: String,
}

/// Notification outbox entry. Written in the same transaction as the RSVP
/// mutation it describes and delivered by the background worker.
/// job_type: RSVP_CONFIRMED, RSVP_WAITLISTED, RSVP_PROMOTED, RSVP_CANCELLED, EVENT_CANCELLED
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: &str, rsvp_id: String, event_id: String, member_id: String, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(JobPayload { rsvp_id, event_id, member_id }),
            execute_at,
            status: "PENDING".to_string(),
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

/// Payload handed to the notification dispatcher once a job is picked up.
#[derive(Debug, Serialize, Clone)]
pub struct Notification {
    pub kind: String,
    pub rsvp_id: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub event_id: String,
    pub event_title: String,
    pub event_start_time: DateTime<Utc>,
}
