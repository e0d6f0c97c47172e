//! HTTP layer: the event receiver at `/events/{*path}` and a small admin
//! API for registrations at `/api/v1/`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
