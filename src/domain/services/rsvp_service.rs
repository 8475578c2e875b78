use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::rsvp::{EventRsvp, MemberRsvp, Rsvp, RsvpCancellation};
use crate::domain::ports::{EventRepository, RsvpRepository};
use crate::error::AppError;

const MAX_CONFLICT_RETRIES: u32 = 3;

/// The only component that mutates RSVP rows. The repository performs each
/// mutation inside a single transaction serialized per event; this service
/// adds the bounded retry on storage conflicts and the read-side validation.
pub struct RsvpService {
    event_repo: Arc<dyn EventRepository>,
    rsvp_repo: Arc<dyn RsvpRepository>,
}

impl RsvpService {
    pub fn new(event_repo: Arc<dyn EventRepository>, rsvp_repo: Arc<dyn RsvpRepository>) -> Self {
        Self { event_repo, rsvp_repo }
    }

    pub async fn create(&self, event_id: &str, member_id: &str) -> Result<Rsvp, AppError> {
        let mut attempt = 0;
        loop {
            match self.rsvp_repo.create(event_id, member_id).await {
                Err(AppError::TransactionConflict) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!("RSVP create conflict on event {} (attempt {}), retrying", event_id, attempt);
                }
                Ok(rsvp) => {
                    info!("RSVP {} created for event {} with status {}", rsvp.id, event_id, rsvp.status);
                    return Ok(rsvp);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn cancel(&self, event_id: &str, member_id: &str) -> Result<RsvpCancellation, AppError> {
        let mut attempt = 0;
        loop {
            match self.rsvp_repo.cancel(event_id, member_id).await {
                Err(AppError::TransactionConflict) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!("RSVP cancel conflict on event {} (attempt {}), retrying", event_id, attempt);
                }
                Ok(outcome) => {
                    info!("RSVP {} cancelled for event {}", outcome.cancelled.id, event_id);
                    if let Some(promoted) = &outcome.promoted {
                        info!("RSVP {} promoted from waitlist on event {}", promoted.id, event_id);
                    }
                    return Ok(outcome);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn list_for_event(&self, event_id: &str, status: Option<&str>) -> Result<Vec<EventRsvp>, AppError> {
        if let Some(s) = status {
            match s {
                "CONFIRMED" | "WAITLISTED" | "CANCELLED" => {}
                _ => return Err(AppError::Validation("Invalid status filter".into())),
            }
        }

        self.event_repo.find_by_id(event_id).await?
            .ok_or(AppError::EventNotFound)?;

        self.rsvp_repo.list_by_event(event_id, status).await
    }

    pub async fn list_for_member(&self, member_id: &str) -> Result<Vec<MemberRsvp>, AppError> {
        self.rsvp_repo.list_by_member(member_id).await
    }
}
