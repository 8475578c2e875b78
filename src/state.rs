use std::sync::Arc;
use crate::domain::ports::{
    EventRepository, JobRepository, MemberRepository, NotificationDispatcher, RsvpRepository,
};
use crate::domain::services::rsvp_service::RsvpService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub member_repo: Arc<dyn MemberRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub rsvp_repo: Arc<dyn RsvpRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub rsvp_service: Arc<RsvpService>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}
