//! Shared domain types for hookrelay.
//!
//! This crate contains the types that flow through event dispatch:
//! registrations, workflow snapshots, inbound events, credentials, run
//! requests, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, bytes.

pub mod config;
pub mod credential;
pub mod error;
pub mod event;
pub mod execution;
pub mod inbound;
pub mod workflow;
