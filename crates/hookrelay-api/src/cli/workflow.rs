//! Workflow CLI commands: import, show.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use hookrelay_core::repository::workflow::WorkflowStore;
use hookrelay_types::workflow::{WorkflowId, WorkflowRecord};

use crate::state::AppState;

const RECENT_EXECUTIONS: i64 = 5;

#[derive(clap::Subcommand)]
pub enum WorkflowCommand {
    /// Import (or replace) a workflow from a JSON file.
    Import {
        /// Path to a workflow JSON document.
        file: std::path::PathBuf,
    },

    /// Show a stored workflow and its trigger nodes.
    Show {
        /// Workflow ID.
        id: String,
    },
}

pub async fn handle_workflow_command(action: WorkflowCommand, state: &AppState, json: bool) -> Result<()> {
    match action {
        WorkflowCommand::Import { file } => import_workflow(state, &file, json).await,
        WorkflowCommand::Show { id } => show_workflow(state, &id, json).await,
    }
}

/// Parse a workflow document.
pub fn parse_workflow(contents: &str) -> Result<WorkflowRecord> {
    let workflow: WorkflowRecord =
        serde_json::from_str(contents).context("invalid workflow document")?;
    if workflow.id.as_str().is_empty() {
        bail!("workflow id must not be empty");
    }
    Ok(workflow)
}

async fn import_workflow(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let workflow = parse_workflow(&contents)?;
    state.workflows.save_workflow(&workflow).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "imported": true, "id": workflow.id.as_str(), "active": workflow.active_version.is_some() })
        );
    } else {
        println!(
            "  {} Imported workflow '{}' ({})",
            style("✓").green().bold(),
            style(&workflow.name).bold(),
            style(&workflow.id).cyan()
        );
        if workflow.active_version.is_none() {
            println!(
                "  {} Workflow has no active version; its triggers will not fire",
                style("!").yellow().bold()
            );
        }
    }
    Ok(())
}

async fn show_workflow(state: &AppState, id: &str, json: bool) -> Result<()> {
    let Some(workflow) = state.workflows.find_workflow(&WorkflowId::new(id)).await? else {
        bail!("workflow '{id}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} ({})",
        style(&workflow.name).bold(),
        style(&workflow.id).cyan()
    );
    println!(
        "  Owner project: {}",
        workflow.owner_project_id().unwrap_or("-")
    );
    match &workflow.active_version {
        Some(version) => {
            for node in &version.nodes {
                let known = state.nodes.get(&node.node_type).is_some();
                println!(
                    "    {} {} [{}]{}",
                    if known { style("•").green() } else { style("•").dim() },
                    node.name,
                    node.node_type,
                    if node.disabled { " (disabled)" } else { "" }
                );
            }
        }
        None => println!("  {}", style("inactive").yellow()),
    }

    let executions = state
        .executions
        .list_for_workflow(&workflow.id, RECENT_EXECUTIONS)
        .await?;
    if !executions.is_empty() {
        println!();
        println!("  {}", style("Recent executions").bold());
        for execution in &executions {
            println!(
                "    {} {} {}",
                style(execution.started_at.format("%Y-%m-%d %H:%M:%S")).dim(),
                execution.id,
                execution.status
            );
        }
    }
    println!();
    Ok(())
}
