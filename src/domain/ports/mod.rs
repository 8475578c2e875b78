use crate::domain::models::{
    member::Member, event::Event, job::{Job, Notification},
    rsvp::{EventRsvp, MemberRsvp, Rsvp, RsvpCancellation},
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, member: &Member) -> Result<Member, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>, AppError>;
    async fn list(&self) -> Result<Vec<Member>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self, include_cancelled: bool) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    /// One-way transition. Enqueues EVENT_CANCELLED outbox jobs for every
    /// active RSVP in the same transaction.
    async fn cancel(&self, id: &str) -> Result<Event, AppError>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    /// Recompute the confirmed count, apply the capacity decision and insert
    /// the row, all inside one transaction serialized against other writes on
    /// the same event.
    async fn create(&self, event_id: &str, member_id: &str) -> Result<Rsvp, AppError>;
    /// Cancel the active RSVP and, when it held a confirmed slot, promote the
    /// earliest-created waitlisted RSVP within the same transaction.
    async fn cancel(&self, event_id: &str, member_id: &str) -> Result<RsvpCancellation, AppError>;
    async fn find_active(&self, event_id: &str, member_id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn list_by_event(&self, event_id: &str, status: Option<&str>) -> Result<Vec<EventRsvp>, AppError>;
    async fn list_by_member(&self, member_id: &str) -> Result<Vec<MemberRsvp>, AppError>;
    async fn count_confirmed(&self, event_id: &str) -> Result<i64, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<(), AppError>;
}
