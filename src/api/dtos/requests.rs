use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// 0 clears the capacity (unlimited); absent leaves it unchanged.
    pub max_capacity: Option<i32>,
}

#[derive(Deserialize)]
pub struct EventListQuery {
    pub include_cancelled: Option<bool>,
}

#[derive(Deserialize)]
pub struct RsvpListQuery {
    pub status: Option<String>,
}
