//! Credential resolver trait definition.

use hookrelay_types::credential::{CredentialData, CredentialRequest};
use hookrelay_types::error::CredentialError;

/// Resolves decrypted credential fields for a workflow's trigger node.
pub trait CredentialResolver: Send + Sync {
    /// Returns `None` when the workflow has no credential of that type.
    fn resolve(
        &self,
        request: &CredentialRequest,
    ) -> impl std::future::Future<Output = Result<Option<CredentialData>, CredentialError>> + Send;
}
