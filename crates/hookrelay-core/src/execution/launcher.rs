//! Invokes trigger hooks and submits the resulting runs.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hookrelay_types::error::ExecutionError;
use hookrelay_types::execution::{
    ExecutionErrorInfo, ExecutionId, ExecutionLink, NodeItem, WebhookResponseData,
};
use hookrelay_types::workflow::{WorkflowNode, WorkflowSnapshot};

use crate::node::{BoxTriggerNode, WebhookContext};

use super::ports::{CompletionNotifier, ErrorContext, ErrorReporter, ExecutionRunner, WaitTracker};
use super::prepare::{build_run_request, prepare_execution_data};

/// What a hook produced, with the failure to record when it errored.
#[derive(Debug, Clone)]
pub struct HookResult {
    pub response: WebhookResponseData,
    pub error: Option<ExecutionErrorInfo>,
}

impl HookResult {
    /// Data the caller should receive synchronously, if any.
    pub fn sync_response(&self) -> Option<&Value> {
        if self.response.no_webhook_response {
            return None;
        }
        self.response.webhook_response.as_ref()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// A submitted execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Launched {
    pub execution_id: ExecutionId,
    /// A parent execution will be resumed once this one completes.
    pub resume_scheduled: bool,
}

/// Runs trigger hooks and hands their data to the execution runner.
pub struct ExecutionLauncher<R, T> {
    runner: Arc<R>,
    waits: Arc<T>,
    reporter: Arc<dyn ErrorReporter>,
}

impl<R, T> ExecutionLauncher<R, T>
where
    R: ExecutionRunner + CompletionNotifier + 'static,
    T: WaitTracker + 'static,
{
    pub fn new(runner: Arc<R>, waits: Arc<T>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            runner,
            waits,
            reporter,
        }
    }

    /// Run a node's hook. A failing hook is reported and turned into a single
    /// empty item so the failure is recorded as an execution.
    pub async fn invoke_hook(&self, node_type: &BoxTriggerNode, ctx: &mut WebhookContext) -> HookResult {
        match node_type.webhook(ctx).await {
            Ok(response) => HookResult {
                response,
                error: None,
            },
            Err(e) => {
                let node = ctx.node();
                let context = ErrorContext {
                    workflow_id: ctx.workflow().id.clone(),
                    node_name: node.name.clone(),
                    node_type: node.node_type.clone(),
                    node_version: node.type_version,
                };
                warn!(
                    workflow_id = %context.workflow_id,
                    node = %context.node_name,
                    node_type = %context.node_type,
                    error = %e,
                    "trigger hook failed"
                );
                self.reporter.report(&e, &context);

                HookResult {
                    response: WebhookResponseData {
                        workflow_data: Some(vec![vec![NodeItem::empty()]]),
                        no_webhook_response: true,
                        ..Default::default()
                    },
                    error: Some(ExecutionErrorInfo {
                        message: e.message.clone(),
                        description: e.description.clone(),
                        node_name: context.node_name,
                        node_type: context.node_type,
                    }),
                }
            }
        }
    }

    /// Submit a run for a hook result. Returns `None` when the hook produced
    /// no workflow data.
    pub async fn launch(
        &self,
        workflow: &WorkflowSnapshot,
        node: &WorkflowNode,
        project_id: Option<&str>,
        hook: HookResult,
    ) -> Result<Option<Launched>, ExecutionError> {
        let HookResult { response, error } = hook;
        let Some(workflow_data) = response.workflow_data else {
            debug!(workflow_id = %workflow.id, node = %node.name, "hook returned no data");
            return Ok(None);
        };

        let parent = response.parent_execution;
        let execution_data =
            prepare_execution_data(node, workflow_data, error, parent.clone(), response.push_ref);
        let run = build_run_request(workflow, execution_data, project_id.map(str::to_string), None);

        let execution_id = self.runner.submit(run).await?;
        info!(
            workflow_id = %workflow.id,
            node = %node.name,
            execution_id = %execution_id,
            "execution started"
        );

        let resume_scheduled = match ExecutionLink::resumable(execution_id.clone(), parent.as_ref()) {
            Some(link) => {
                self.schedule_resume(link);
                true
            }
            None => false,
        };

        Ok(Some(Launched {
            execution_id,
            resume_scheduled,
        }))
    }

    /// Resume the parent once the child completes. Detached: the returned
    /// handle may be dropped.
    pub fn schedule_resume(&self, link: ExecutionLink) -> JoinHandle<()> {
        let completion = self.runner.on_complete(&link.child);
        let waits = Arc::clone(&self.waits);

        tokio::spawn(async move {
            completion.await;
            let parent = &link.parent.execution_id;
            match waits.resume(parent).await {
                Ok(()) => debug!(child = %link.child, parent = %parent, "parent execution resumed"),
                Err(e) => warn!(
                    child = %link.child,
                    parent = %parent,
                    error = %e,
                    "failed to resume parent execution"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FixedNode, RecordingReporter, RecordingRunner, RecordingWaits, snapshot, trigger_node,
        webhook_context,
    };
    use hookrelay_types::error::NodeError;
    use hookrelay_types::execution::ParentExecution;
    use hookrelay_types::inbound::InboundEvent;
    use serde_json::json;
    use std::time::Duration;

    type TestLauncher = ExecutionLauncher<RecordingRunner, RecordingWaits>;

    fn launcher() -> (TestLauncher, Arc<RecordingRunner>, Arc<RecordingWaits>, Arc<RecordingReporter>) {
        let runner = Arc::new(RecordingRunner::new());
        let waits = Arc::new(RecordingWaits::new());
        let reporter = Arc::new(RecordingReporter::new());
        let launcher = ExecutionLauncher::new(
            Arc::clone(&runner),
            Arc::clone(&waits),
            Arc::clone(&reporter) as Arc<dyn ErrorReporter>,
        );
        (launcher, runner, waits, reporter)
    }

    fn with_parent(should_resume: Option<bool>) -> WebhookResponseData {
        WebhookResponseData {
            parent_execution: Some(ParentExecution {
                execution_id: ExecutionId::new("parent-1"),
                should_resume,
            }),
            ..WebhookResponseData::run_with(vec![NodeItem::empty()])
        }
    }

    async fn run_hook(launcher: &TestLauncher, node_type: BoxTriggerNode) -> (HookResult, Option<Launched>) {
        let node = trigger_node("Trigger", &["message"]);
        let workflow = snapshot("wf-1", vec![node.clone()]);
        let mut ctx = webhook_context(node.clone(), InboundEvent::new("hook", "{}"));
        let hook = launcher.invoke_hook(&node_type, &mut ctx).await;
        let launched = launcher
            .launch(&workflow, &node, Some("p-1"), hook.clone())
            .await
            .unwrap();
        (hook, launched)
    }

    #[tokio::test]
    async fn test_successful_hook_submits_run() {
        let (launcher, runner, _, reporter) = launcher();
        let node_type = BoxTriggerNode::new(FixedNode::ok(
            "eventTrigger",
            WebhookResponseData::run_with(vec![NodeItem::new(json!({ "text": "hi" }))]),
        ));

        let (hook, launched) = run_hook(&launcher, node_type).await;
        assert!(!hook.failed());
        let launched = launched.unwrap();
        assert!(!launched.resume_scheduled);

        let runs = runner.submitted();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].project_id.as_deref(), Some("p-1"));
        assert_eq!(runs[0].execution_data.start_node.as_deref(), Some("Trigger"));
        assert!(reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_no_workflow_data_launches_nothing() {
        let (launcher, runner, _, _) = launcher();
        let node_type = BoxTriggerNode::new(FixedNode::ok("eventTrigger", WebhookResponseData::skip()));

        let (_, launched) = run_hook(&launcher, node_type).await;
        assert!(launched.is_none());
        assert!(runner.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_failed_hook_is_reported_and_recorded() {
        let (launcher, runner, _, reporter) = launcher();
        let node_type = BoxTriggerNode::new(FixedNode::err(
            "eventTrigger",
            NodeError::new("boom").with_description("bad payload"),
        ));

        let (hook, launched) = run_hook(&launcher, node_type).await;
        assert!(hook.failed());
        assert!(hook.sync_response().is_none());
        assert!(launched.is_some());

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "boom");
        assert_eq!(reports[0].1.node_name, "Trigger");
        assert_eq!(reports[0].1.workflow_id.as_str(), "wf-1");

        let runs = runner.submitted();
        let result = &runs[0].execution_data.result_data;
        assert_eq!(result.error.as_ref().map(|e| e.message.as_str()), Some("boom"));
        assert_eq!(result.last_node_executed.as_deref(), Some("Trigger"));
        assert_eq!(runs[0].execution_data.execution_stack[0].data, vec![vec![NodeItem::empty()]]);
    }

    #[tokio::test]
    async fn test_submit_failure_is_returned() {
        let runner = Arc::new(RecordingRunner::new().failing());
        let launcher = ExecutionLauncher::new(
            runner,
            Arc::new(RecordingWaits::new()),
            Arc::new(RecordingReporter::new()) as Arc<dyn ErrorReporter>,
        );
        let node = trigger_node("Trigger", &["message"]);
        let workflow = snapshot("wf-1", vec![node.clone()]);
        let hook = HookResult {
            response: WebhookResponseData::run_with(vec![NodeItem::empty()]),
            error: None,
        };

        let err = launcher.launch(&workflow, &node, None, hook).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Submit(_)));
    }

    #[tokio::test]
    async fn test_parent_resumed_exactly_once_after_completion() {
        let (launcher, runner, waits, _) = launcher();
        let node_type = BoxTriggerNode::new(FixedNode::ok("eventTrigger", with_parent(None)));

        let (_, launched) = run_hook(&launcher, node_type).await;
        let launched = launched.unwrap();
        assert!(launched.resume_scheduled);

        tokio::task::yield_now().await;
        assert!(waits.resumed().is_empty());

        runner.complete(&launched.execution_id);
        tokio::time::timeout(Duration::from_secs(1), waits.wait_for_resume())
            .await
            .unwrap();
        assert_eq!(waits.resumed(), vec![ExecutionId::new("parent-1")]);
    }

    #[tokio::test]
    async fn test_parent_not_resumed_when_opted_out() {
        let (launcher, runner, waits, _) = launcher();
        let node_type = BoxTriggerNode::new(FixedNode::ok("eventTrigger", with_parent(Some(false))));

        let (_, launched) = run_hook(&launcher, node_type).await;
        let launched = launched.unwrap();
        assert!(!launched.resume_scheduled);

        runner.complete(&launched.execution_id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(waits.resumed().is_empty());
    }
}
