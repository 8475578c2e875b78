use serde::Serialize;
use crate::domain::models::event::Event;

#[derive(Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: Event,
    pub confirmed_count: i64,
}
