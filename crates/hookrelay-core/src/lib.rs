//! Dispatch logic and port trait definitions for hookrelay.
//!
//! This crate defines the "ports" (repository, cache, credential and
//! execution traits) that the infrastructure layer implements, and the
//! dispatcher that drives an inbound event through them. It depends only on
//! `hookrelay-types` -- never on `hookrelay-infra` or any database/IO crate.

pub mod auth;
pub mod cache;
pub mod dispatch;
pub mod execution;
pub mod node;
pub mod registry;
pub mod repository;
pub mod static_data;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;
