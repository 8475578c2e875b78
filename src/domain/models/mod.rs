pub mod member;
pub mod event;
pub mod rsvp;
pub mod job;
