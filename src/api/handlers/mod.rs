pub mod health;
pub mod member;
pub mod event;
pub mod rsvp;
