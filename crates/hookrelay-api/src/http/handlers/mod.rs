//! HTTP request handlers.

pub mod event;
pub mod registration;
