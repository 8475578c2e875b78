pub mod capacity;
pub mod rsvp_service;
