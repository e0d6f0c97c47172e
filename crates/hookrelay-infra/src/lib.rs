//! Infrastructure layer for hookrelay.
//!
//! Contains implementations of the ports defined in `hookrelay-core`:
//! SQLite storage, the in-process lookup cache, the signing-secret
//! authenticator, local execution adapters, and configuration loading.

pub mod auth;
pub mod cache;
pub mod config;
pub mod execution;
pub mod filesystem;
pub mod sqlite;
