//! In-memory fakes of the ports and small builders shared by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::sync::{Notify, watch};

use hookrelay_types::credential::{CredentialData, CredentialRequest};
use hookrelay_types::error::{CacheError, CredentialError, ExecutionError, NodeError, RepositoryError};
use hookrelay_types::event::EventRegistration;
use hookrelay_types::execution::{ExecutionId, RunRequest, WebhookResponseData};
use hookrelay_types::inbound::InboundEvent;
use hookrelay_types::workflow::{
    OWNER_ROLE, WorkflowId, WorkflowNode, WorkflowRecord, WorkflowShare, WorkflowSnapshot,
    WorkflowVersion,
};

use crate::auth::AuthStatus;
use crate::cache::LookupCache;
use crate::dispatch::DispatchContext;
use crate::execution::{CompletionNotifier, ErrorContext, ErrorReporter, ExecutionRunner, WaitTracker};
use crate::node::{TriggerNode, WebhookContext};
use crate::repository::credential::CredentialResolver;
use crate::repository::event::EventRepository;
use crate::repository::workflow::WorkflowStore;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn node_of_type(name: &str, node_type: &str, subscriptions: &[&str]) -> WorkflowNode {
    WorkflowNode {
        name: name.to_string(),
        node_type: node_type.to_string(),
        type_version: 1.0,
        parameters: json!({ "trigger": subscriptions }),
        credentials: BTreeMap::new(),
        disabled: false,
    }
}

pub fn trigger_node(name: &str, subscriptions: &[&str]) -> WorkflowNode {
    node_of_type(name, "eventTrigger", subscriptions)
}

pub fn snapshot(id: &str, nodes: Vec<WorkflowNode>) -> WorkflowSnapshot {
    WorkflowSnapshot {
        id: WorkflowId::new(id),
        name: format!("Workflow {id}"),
        nodes,
        connections: json!({}),
        static_data: Value::Null,
        settings: Value::Null,
        active: true,
    }
}

/// An active workflow owned by project `p-owner`.
pub fn workflow_record(id: &str, nodes: Vec<WorkflowNode>) -> WorkflowRecord {
    WorkflowRecord {
        id: WorkflowId::new(id),
        name: format!("Workflow {id}"),
        active_version: Some(WorkflowVersion {
            nodes,
            connections: json!({}),
        }),
        static_data: Value::Null,
        settings: Value::Null,
        shares: vec![WorkflowShare {
            project_id: "p-owner".to_string(),
            role: OWNER_ROLE.to_string(),
        }],
    }
}

pub fn registration(path: &str, usages: &[(&str, &[&str])]) -> EventRegistration {
    let mut registration = EventRegistration::new(path);
    for (workflow_id, nodes) in usages {
        for node in *nodes {
            registration.add_usage(WorkflowId::new(*workflow_id), *node);
        }
    }
    registration
}

pub fn dispatch_context(workflow_id: &str, event: InboundEvent) -> DispatchContext {
    DispatchContext {
        path: event.path.clone(),
        workflow_id: WorkflowId::new(workflow_id),
        project_id: Some("p-owner".to_string()),
        auth: AuthStatus::NotRequired,
        event: Arc::new(event),
    }
}

pub fn webhook_context(node: WorkflowNode, event: InboundEvent) -> WebhookContext {
    let workflow = Arc::new(snapshot("wf-1", vec![node.clone()]));
    WebhookContext::new(
        workflow,
        node,
        Arc::new(dispatch_context("wf-1", event)),
        Value::Null,
    )
}

// ---------------------------------------------------------------------------
// Event repository
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryEvents {
    rows: Mutex<BTreeMap<String, EventRegistration>>,
    find_calls: AtomicUsize,
}

impl MemoryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(registrations: Vec<EventRegistration>) -> Self {
        let events = Self::new();
        {
            let mut rows = events.rows.lock().unwrap();
            for registration in registrations {
                rows.insert(registration.path.clone(), registration);
            }
        }
        events
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }
}

impl EventRepository for MemoryEvents {
    async fn find_by_path(&self, path: &str) -> Result<Option<EventRegistration>, RepositoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().get(path).cloned())
    }

    async fn save(&self, registration: &EventRegistration) -> Result<(), RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .insert(registration.path.clone(), registration.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.lock().unwrap().remove(path).is_some())
    }

    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<EventRegistration>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.usages.contains_key(workflow_id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<EventRegistration>, RepositoryError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Lookup cache
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation errors.
    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("cache offline".to_string()));
        }
        Ok(())
    }
}

impl LookupCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.check()?;
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Workflow store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryWorkflows {
    records: Mutex<HashMap<WorkflowId, WorkflowRecord>>,
    saved: Mutex<Vec<(WorkflowId, Value)>>,
    find_calls: AtomicUsize,
    failing_saves: AtomicBool,
}

impl MemoryWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(records: Vec<WorkflowRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    pub fn failing_saves(self) -> Self {
        self.failing_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn saved_static_data(&self) -> Vec<(WorkflowId, Value)> {
        self.saved.lock().unwrap().clone()
    }
}

impl WorkflowStore for MemoryWorkflows {
    async fn find_workflow(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, RepositoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn save_static_data(&self, id: &WorkflowId, static_data: &Value) -> Result<(), RepositoryError> {
        if self.failing_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((id.clone(), static_data.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCredentials {
    by_type: HashMap<String, CredentialData>,
    by_id: HashMap<String, (String, CredentialData)>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_project: Mutex<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential of `credential_type` with a single string field.
    pub fn with(mut self, credential_type: &str, field: &str, value: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(field.to_string(), Value::String(value.to_string()));
        self.by_type
            .insert(credential_type.to_string(), CredentialData::new(fields));
        self
    }

    /// Add a credential that nodes select explicitly by `id`.
    pub fn with_id(mut self, id: &str, credential_type: &str, field: &str, value: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(field.to_string(), Value::String(value.to_string()));
        self.by_id.insert(
            id.to_string(),
            (credential_type.to_string(), CredentialData::new(fields)),
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_project(&self) -> Option<String> {
        self.last_project.lock().unwrap().clone()
    }
}

impl CredentialResolver for MemoryCredentials {
    async fn resolve(&self, request: &CredentialRequest) -> Result<Option<CredentialData>, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_project.lock().unwrap() = request.project_id.clone();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(CredentialError::Store("vault sealed".to_string()));
        }
        match &request.credential_id {
            Some(id) => Ok(self
                .by_id
                .get(id)
                .filter(|(credential_type, _)| *credential_type == request.credential_type)
                .map(|(_, data)| data.clone())),
            None => Ok(self.by_type.get(&request.credential_type).cloned()),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution runner, wait tracker, error reporter
// ---------------------------------------------------------------------------

pub struct RecordingRunner {
    submitted: Mutex<Vec<RunRequest>>,
    completed: watch::Sender<Vec<ExecutionId>>,
    failing: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        let (completed, _) = watch::channel(Vec::new());
        Self {
            submitted: Mutex::new(Vec::new()),
            completed,
            failing: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn submitted(&self) -> Vec<RunRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Signal that an execution finished.
    pub fn complete(&self, execution_id: &ExecutionId) {
        self.completed.send_modify(|done| done.push(execution_id.clone()));
    }
}

impl ExecutionRunner for RecordingRunner {
    async fn submit(&self, run: RunRequest) -> Result<ExecutionId, ExecutionError> {
        if self.failing {
            return Err(ExecutionError::Submit("runner unavailable".to_string()));
        }
        self.submitted.lock().unwrap().push(run);
        Ok(ExecutionId::generate())
    }
}

impl CompletionNotifier for RecordingRunner {
    fn on_complete(
        &self,
        execution_id: &ExecutionId,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.completed.subscribe();
        let execution_id = execution_id.clone();
        async move {
            let _ = rx.wait_for(|done| done.contains(&execution_id)).await;
        }
    }
}

#[derive(Default)]
pub struct RecordingWaits {
    resumed: Mutex<Vec<ExecutionId>>,
    notify: Notify,
}

impl RecordingWaits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resumed(&self) -> Vec<ExecutionId> {
        self.resumed.lock().unwrap().clone()
    }

    pub async fn wait_for_resume(&self) {
        self.notify.notified().await;
    }
}

impl WaitTracker for RecordingWaits {
    async fn resume(&self, execution_id: &ExecutionId) -> Result<(), ExecutionError> {
        self.resumed.lock().unwrap().push(execution_id.clone());
        self.notify.notify_one();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, ErrorContext)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, ErrorContext)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &NodeError, context: &ErrorContext) {
        self.reports
            .lock()
            .unwrap()
            .push((error.message.clone(), context.clone()));
    }
}

// ---------------------------------------------------------------------------
// Trigger nodes
// ---------------------------------------------------------------------------

/// Returns the same result for every event.
pub struct FixedNode {
    type_name: String,
    credential_type: Option<String>,
    synchronous: bool,
    delay: Option<Duration>,
    result: Result<WebhookResponseData, NodeError>,
}

impl FixedNode {
    pub fn ok(type_name: &str, response: WebhookResponseData) -> Self {
        Self {
            type_name: type_name.to_string(),
            credential_type: None,
            synchronous: false,
            delay: None,
            result: Ok(response),
        }
    }

    pub fn err(type_name: &str, error: NodeError) -> Self {
        Self {
            type_name: type_name.to_string(),
            credential_type: None,
            synchronous: false,
            delay: None,
            result: Err(error),
        }
    }

    pub fn with_credential(mut self, credential_type: &str) -> Self {
        self.credential_type = Some(credential_type.to_string());
        self
    }

    pub fn synchronous(mut self) -> Self {
        self.synchronous = true;
        self
    }

    /// Sleep before returning from the hook.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl TriggerNode for FixedNode {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn credential_type(&self) -> Option<&str> {
        self.credential_type.as_deref()
    }

    fn responds_synchronously(&self) -> bool {
        self.synchronous
    }

    async fn webhook(&self, _ctx: &mut WebhookContext) -> Result<WebhookResponseData, NodeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Counts hook calls in workflow static data and emits the event body.
pub struct CountingNode;

impl TriggerNode for CountingNode {
    fn type_name(&self) -> &str {
        "countingTrigger"
    }

    async fn webhook(&self, ctx: &mut WebhookContext) -> Result<WebhookResponseData, NodeError> {
        let data = ctx.static_data_mut();
        let hits = data.get("hits").and_then(Value::as_u64).unwrap_or(0);
        data["hits"] = json!(hits + 1);
        let body = ctx.body().clone();
        Ok(WebhookResponseData::run_with(vec![
            hookrelay_types::execution::NodeItem::new(body),
        ]))
    }
}
