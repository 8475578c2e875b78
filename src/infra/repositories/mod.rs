pub mod sqlite_member_repo;
pub mod sqlite_event_repo;
pub mod sqlite_rsvp_repo;
pub mod sqlite_job_repo;

pub mod postgres_member_repo;
pub mod postgres_event_repo;
pub mod postgres_rsvp_repo;
pub mod postgres_job_repo;
