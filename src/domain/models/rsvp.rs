use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A member's request to attend an event. Rows are never deleted, only
/// status-transitioned, so the cancelled history remains as an audit trail.
/// Status is one of CONFIRMED, WAITLISTED, CANCELLED.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Rsvp {
    pub id: String,
    pub event_id: String,
    pub member_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Rsvp {
    pub fn new(event_id: String, member_id: String, status: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            member_id,
            status,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a cancellation: the row that was cancelled, and the waitlisted
/// row promoted into the freed slot, if any.
#[derive(Debug, Serialize, Clone)]
pub struct RsvpCancellation {
    pub cancelled: Rsvp,
    pub promoted: Option<Rsvp>,
}

/// Roster row: RSVP joined with member details.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct EventRsvp {
    pub id: String,
    pub event_id: String,
    pub member_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub member_name: String,
    pub member_email: String,
}

/// "My RSVPs" row: RSVP joined with event details.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct MemberRsvp {
    pub id: String,
    pub event_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub event_title: String,
    pub event_start_time: DateTime<Utc>,
    pub event_cancelled: bool,
}
