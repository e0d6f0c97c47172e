use thiserror::Error;

use crate::workflow::WorkflowId;

/// Errors from repository operations (used by trait definitions in hookrelay-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by a lookup cache backend.
///
/// Never fatal: callers downgrade every variant to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be encoded: {0}")]
    Encode(String),
}

/// Errors from credential resolution.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential store error: {0}")]
    Store(String),

    #[error("credential '{0}' is malformed")]
    Malformed(String),
}

/// Errors from the execution runner and wait tracker.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("execution submission failed: {0}")]
    Submit(String),

    #[error("execution {0} not found")]
    NotFound(String),

    #[error("resume failed: {0}")]
    Resume(String),
}

/// Error raised by a trigger node's webhook hook.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NodeError {
    pub message: String,
    pub description: Option<String>,
}

impl NodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Errors from event dispatch.
///
/// Only `EventNotRegistered` and `MalformedRequest` are ever surfaced to the
/// webhook caller; the rest are contained to one workflow's branch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no event registered for path '{0}'")]
    EventNotRegistered(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("could not find workflow with id '{0}'")]
    WorkflowNotFound(WorkflowId),

    #[error("active version not found for workflow with id '{0}'")]
    NoActiveVersion(WorkflowId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
