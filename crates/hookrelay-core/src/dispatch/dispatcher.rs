//! EventDispatcher -- fans an inbound event out to its subscribed workflows.
//!
//! Each workflow is processed by an independent task (a "workflow unit")
//! that owns its snapshot and static data. Within a unit, triggers run
//! sequentially over the trigger list captured from the registration.
//! Units are owned by a detached collector task, so they run to completion
//! even if the caller goes away. The caller is answered as soon as a trigger
//! returns a synchronous response. Units without a synchronously responding
//! trigger release the caller once their snapshot is loaded; the rest hold
//! it until their hook stage ends, bounded by `sync_response_timeout`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use hookrelay_types::error::DispatchError;
use hookrelay_types::inbound::InboundEvent;
use hookrelay_types::workflow::{WorkflowId, WorkflowSnapshot};

use crate::auth::{AuthGate, AuthTarget};
use crate::cache::LookupCache;
use crate::execution::{CompletionNotifier, ExecutionLauncher, ExecutionRunner, WaitTracker};
use crate::node::{NodeTypeRegistry, WebhookContext};
use crate::registry::EventResolver;
use crate::repository::credential::CredentialResolver;
use crate::repository::event::EventRepository;
use crate::repository::workflow::WorkflowStore;
use crate::static_data::StaticDataPersister;
use crate::trigger::TriggerMatcher;

use super::DispatchContext;
use super::report::{DispatchReceipt, DispatchResponse, TriggerOutcome, TriggerReport, WorkflowReport};

/// Dispatches inbound events to workflow executions.
pub struct EventDispatcher<E, K, W, C, R, T> {
    resolver: Arc<EventResolver<E, K>>,
    workflows: Arc<W>,
    gate: Arc<AuthGate<C>>,
    matcher: TriggerMatcher,
    nodes: Arc<NodeTypeRegistry>,
    launcher: Arc<ExecutionLauncher<R, T>>,
    persister: Arc<StaticDataPersister<W>>,
    sync_response_timeout: Duration,
}

impl<E, K, W, C, R, T> Clone for EventDispatcher<E, K, W, C, R, T> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            workflows: Arc::clone(&self.workflows),
            gate: Arc::clone(&self.gate),
            matcher: self.matcher,
            nodes: Arc::clone(&self.nodes),
            launcher: Arc::clone(&self.launcher),
            persister: Arc::clone(&self.persister),
            sync_response_timeout: self.sync_response_timeout,
        }
    }
}

impl<E, K, W, C, R, T> EventDispatcher<E, K, W, C, R, T>
where
    E: EventRepository + 'static,
    K: LookupCache + 'static,
    W: WorkflowStore + 'static,
    C: CredentialResolver + 'static,
    R: ExecutionRunner + CompletionNotifier + 'static,
    T: WaitTracker + 'static,
{
    pub fn new(
        resolver: EventResolver<E, K>,
        workflows: Arc<W>,
        gate: AuthGate<C>,
        nodes: Arc<NodeTypeRegistry>,
        launcher: ExecutionLauncher<R, T>,
        sync_response_timeout: Duration,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            persister: Arc::new(StaticDataPersister::new(Arc::clone(&workflows))),
            workflows,
            gate: Arc::new(gate),
            matcher: TriggerMatcher::new(),
            nodes,
            launcher: Arc::new(launcher),
            sync_response_timeout,
        }
    }

    /// Accept an inbound event.
    ///
    /// Fails only for malformed bodies and unregistered paths; every other
    /// problem is contained to one workflow's report.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<DispatchReceipt, DispatchError> {
        if event.event_type().is_none() {
            return Err(DispatchError::MalformedRequest(
                "body has no string `type`".to_string(),
            ));
        }
        if event.is_url_verification() {
            let challenge = event.challenge().cloned().unwrap_or(Value::Null);
            debug!(path = %event.path, "answering url verification");
            return Ok(DispatchReceipt::immediate(DispatchResponse::Challenge(challenge)));
        }

        let registration = self.resolver.resolve(&event.path).await?;
        let event = Arc::new(event);
        info!(
            path = %registration.path,
            workflows = registration.usages.len(),
            sub_type = event.sub_type().unwrap_or(""),
            "dispatching event"
        );

        let (response_tx, mut response_rx) = mpsc::channel::<Value>(registration.usages.len().max(1));
        let mut units: JoinSet<WorkflowReport> = JoinSet::new();

        for (workflow_id, triggers) in registration.usages {
            let this = self.clone();
            let event = Arc::clone(&event);
            let path = registration.path.clone();
            let responder = response_tx.clone();
            let span = info_span!("workflow_unit", workflow_id = %workflow_id);

            units.spawn(
                async move { this.run_unit(path, workflow_id, triggers, event, responder).await }
                    .instrument(span),
            );
        }
        drop(response_tx);

        let settled = tokio::spawn(async move {
            let mut reports = Vec::new();
            while let Some(joined) = units.join_next().await {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => error!(error = %e, "workflow unit panicked"),
                }
            }
            reports
        });

        let response = match tokio::time::timeout(self.sync_response_timeout, response_rx.recv()).await {
            Ok(Some(value)) => DispatchResponse::Respond(value),
            Ok(None) => DispatchResponse::Acknowledged,
            Err(_) => {
                debug!("no synchronous response within timeout");
                DispatchResponse::Acknowledged
            }
        };

        Ok(DispatchReceipt {
            response,
            settled: Some(settled),
        })
    }

    async fn run_unit(
        self,
        path: String,
        workflow_id: WorkflowId,
        triggers: Vec<String>,
        event: Arc<InboundEvent>,
        responder: mpsc::Sender<Value>,
    ) -> WorkflowReport {
        let (snapshot, project_id) = match self.load_snapshot(&workflow_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "workflow unit aborted");
                return WorkflowReport {
                    workflow_id,
                    result: Err(e),
                    static_data_saved: false,
                };
            }
        };

        // Only units that can answer the caller keep it waiting.
        let responder = self
            .responds_synchronously(&snapshot, &triggers)
            .then_some(responder);

        let targets = self.auth_targets(&snapshot, &triggers);
        let auth = match self
            .gate
            .authorize(&workflow_id, project_id.as_deref(), &targets, &event)
            .await
        {
            Ok(status) => status,
            Err(reason) => {
                debug!(reason = %reason, "event not authenticated, skipping workflow");
                let reports = triggers
                    .into_iter()
                    .map(|node| TriggerReport {
                        node,
                        outcome: TriggerOutcome::AuthenticationRejected,
                    })
                    .collect();
                return WorkflowReport {
                    workflow_id,
                    result: Ok(reports),
                    static_data_saved: false,
                };
            }
        };

        let dispatch = Arc::new(DispatchContext {
            path,
            workflow_id: workflow_id.clone(),
            project_id,
            auth,
            event,
        });

        let mut static_data = snapshot.static_data.clone();
        let mut reports = Vec::with_capacity(triggers.len());

        for trigger in &triggers {
            let outcome = self
                .run_trigger(&snapshot, &dispatch, trigger, &mut static_data, responder.as_ref())
                .await;
            reports.push(TriggerReport {
                node: trigger.clone(),
                outcome,
            });
        }

        // Hook stage is over for this unit.
        drop(responder);

        let static_data_saved = self
            .persister
            .persist(&workflow_id, &snapshot.static_data, &static_data)
            .await;

        WorkflowReport {
            workflow_id,
            result: Ok(reports),
            static_data_saved,
        }
    }

    async fn load_snapshot(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<(Arc<WorkflowSnapshot>, Option<String>), DispatchError> {
        let record = self
            .workflows
            .find_workflow(workflow_id)
            .await?
            .ok_or_else(|| DispatchError::WorkflowNotFound(workflow_id.clone()))?;
        let snapshot = record.snapshot()?;
        let project_id = record.owner_project_id().map(str::to_string);
        Ok((Arc::new(snapshot), project_id))
    }

    fn responds_synchronously(&self, snapshot: &WorkflowSnapshot, triggers: &[String]) -> bool {
        triggers
            .iter()
            .filter_map(|name| snapshot.node(name))
            .filter(|node| !node.disabled)
            .filter_map(|node| self.nodes.get(&node.node_type))
            .any(|node_type| node_type.responds_synchronously())
    }

    /// Credentials declared by the workflow's registered trigger nodes,
    /// one target per distinct credential type and selected credential.
    fn auth_targets(&self, snapshot: &WorkflowSnapshot, triggers: &[String]) -> Vec<AuthTarget> {
        let mut targets: Vec<AuthTarget> = Vec::new();
        let mut seen = HashSet::new();
        for node in triggers
            .iter()
            .filter_map(|name| snapshot.node(name))
            .filter(|node| !node.disabled)
        {
            let Some(credential_type) = self
                .nodes
                .get(&node.node_type)
                .and_then(|node_type| node_type.credential_type())
            else {
                continue;
            };
            let credential_id = node
                .credentials
                .get(credential_type)
                .and_then(|c| c.id.clone());
            if seen.insert((credential_type.to_string(), credential_id.clone())) {
                targets.push(AuthTarget {
                    credential_type: credential_type.to_string(),
                    node_name: node.name.clone(),
                    credential_id,
                });
            }
        }
        targets
    }

    async fn run_trigger(
        &self,
        snapshot: &Arc<WorkflowSnapshot>,
        dispatch: &Arc<DispatchContext>,
        trigger: &str,
        static_data: &mut Value,
        responder: Option<&mpsc::Sender<Value>>,
    ) -> TriggerOutcome {
        let Some(node) = snapshot.node(trigger) else {
            warn!(node = trigger, "registration references a node the workflow does not have");
            return TriggerOutcome::StaleTriggerReference;
        };
        if node.disabled {
            debug!(node = trigger, "trigger node disabled");
            return TriggerOutcome::Disabled;
        }
        let Some(node_type) = self.nodes.get(&node.node_type) else {
            warn!(node = trigger, node_type = %node.node_type, "unknown trigger node type");
            return TriggerOutcome::UnknownNodeType(node.node_type.clone());
        };

        let subscribed = self.matcher.matches(
            node,
            node_type.subscription_parameter(),
            snapshot,
            static_data,
            dispatch.event.sub_type(),
        );
        if !subscribed {
            debug!(node = trigger, "trigger not subscribed to event");
            return TriggerOutcome::NotSubscribed;
        }

        let mut ctx = WebhookContext::new(
            Arc::clone(snapshot),
            node.clone(),
            Arc::clone(dispatch),
            std::mem::take(static_data),
        );
        let hook = self.launcher.invoke_hook(node_type, &mut ctx).await;
        *static_data = ctx.into_static_data();

        if node_type.responds_synchronously() {
            if let (Some(responder), Some(value)) = (responder, hook.sync_response()) {
                // Only the first response reaches the caller.
                let _ = responder.try_send(value.clone());
            }
        }

        let hook_failed = hook.failed();
        match self
            .launcher
            .launch(snapshot, node, dispatch.project_id.as_deref(), hook)
            .await
        {
            Ok(Some(launched)) => TriggerOutcome::Started {
                execution_id: launched.execution_id,
                hook_failed,
                resume_scheduled: launched.resume_scheduled,
            },
            Ok(None) => TriggerOutcome::NoData,
            Err(e) => {
                error!(node = trigger, error = %e, "failed to submit execution");
                TriggerOutcome::SubmitFailed(e.to_string())
            }
        }
    }
}
