pub mod webhook_notify_service;
pub mod log_notify_service;
