//! Credential-backed authentication gate for one workflow unit.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use hookrelay_types::credential::CredentialRequest;
use hookrelay_types::inbound::InboundEvent;
use hookrelay_types::workflow::WorkflowId;

use crate::repository::credential::CredentialResolver;

use super::{AuthOutcome, AuthenticatorSet, RejectReason};

/// Whether the event was verified for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// At least one credential verified the event.
    Authenticated,
    /// No trigger of the workflow carries a verifiable credential.
    NotRequired,
}

/// A credential a trigger node of the workflow declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTarget {
    pub credential_type: String,
    pub node_name: String,
    pub credential_id: Option<String>,
}

impl AuthTarget {
    /// Targets naming the same credential share one check.
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.credential_type.as_str(), self.credential_id.as_deref())
    }
}

/// Resolves credentials and runs the matching authenticator.
///
/// Resolution is bounded by `timeout`; a timeout or resolver error rejects
/// the event (fail closed). So does an explicitly selected credential that
/// no longer resolves.
pub struct AuthGate<C> {
    credentials: Arc<C>,
    authenticators: AuthenticatorSet,
    timeout: Duration,
}

impl<C: CredentialResolver> AuthGate<C> {
    pub fn new(credentials: Arc<C>, authenticators: AuthenticatorSet, timeout: Duration) -> Self {
        Self {
            credentials,
            authenticators,
            timeout,
        }
    }

    /// Check one credential target.
    pub async fn check(
        &self,
        workflow_id: &WorkflowId,
        project_id: Option<&str>,
        target: &AuthTarget,
        event: &InboundEvent,
    ) -> AuthOutcome {
        let Some(authenticator) = self.authenticators.get(&target.credential_type) else {
            debug!(
                credential_type = %target.credential_type,
                "no authenticator registered for credential type"
            );
            return AuthOutcome::NotApplicable;
        };

        let request = CredentialRequest {
            workflow_id: workflow_id.clone(),
            project_id: project_id.map(str::to_string),
            credential_type: target.credential_type.clone(),
            node_name: target.node_name.clone(),
            credential_id: target.credential_id.clone(),
        };

        let resolved = tokio::time::timeout(self.timeout, self.credentials.resolve(&request)).await;
        match resolved {
            Err(_) => {
                warn!(
                    workflow_id = %workflow_id,
                    credential_type = %target.credential_type,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "credential resolution timed out"
                );
                AuthOutcome::Rejected(RejectReason::Timeout)
            }
            Ok(Err(e)) => {
                warn!(
                    workflow_id = %workflow_id,
                    credential_type = %target.credential_type,
                    error = %e,
                    "credential resolution failed"
                );
                AuthOutcome::Rejected(RejectReason::CredentialUnavailable)
            }
            Ok(Ok(None)) => match &target.credential_id {
                Some(credential_id) => {
                    warn!(
                        workflow_id = %workflow_id,
                        credential_type = %target.credential_type,
                        credential_id = %credential_id,
                        "selected credential not found"
                    );
                    AuthOutcome::Rejected(RejectReason::CredentialUnavailable)
                }
                None => AuthOutcome::NotApplicable,
            },
            Ok(Ok(Some(data))) => authenticator.verify(&data, event, Utc::now()),
        }
    }

    /// Authorize an event for a workflow against every credential its
    /// triggers declare. Each distinct credential is checked once.
    pub async fn authorize(
        &self,
        workflow_id: &WorkflowId,
        project_id: Option<&str>,
        targets: &[AuthTarget],
        event: &InboundEvent,
    ) -> Result<AuthStatus, RejectReason> {
        let mut checked = HashSet::new();
        let mut status = AuthStatus::NotRequired;

        for target in targets {
            if !checked.insert(target.key()) {
                continue;
            }
            match self.check(workflow_id, project_id, target, event).await {
                AuthOutcome::Rejected(reason) => {
                    debug!(
                        workflow_id = %workflow_id,
                        credential_type = %target.credential_type,
                        reason = %reason,
                        "event rejected"
                    );
                    return Err(reason);
                }
                AuthOutcome::Allowed => status = AuthStatus::Authenticated,
                AuthOutcome::NotApplicable => {}
            }
        }

        Ok(status)
    }
}
