//! Event registry trait definition.

use hookrelay_types::error::RepositoryError;
use hookrelay_types::event::EventRegistration;
use hookrelay_types::workflow::WorkflowId;

/// Durable store of path registrations.
///
/// Paths passed in are already normalized. A path maps to at most one
/// registration.
pub trait EventRepository: Send + Sync {
    /// Look up the registration for a normalized path.
    fn find_by_path(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<EventRegistration>, RepositoryError>> + Send;

    /// Insert or replace the registration keyed by its path.
    fn save(
        &self,
        registration: &EventRegistration,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a registration. Returns true if a row was removed.
    fn delete(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// All registrations that reference the given workflow.
    fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Vec<EventRegistration>, RepositoryError>> + Send;

    /// All registrations, ordered by path.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<EventRegistration>, RepositoryError>> + Send;
}
