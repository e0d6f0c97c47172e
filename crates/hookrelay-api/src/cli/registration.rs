//! Registration CLI commands: register, deregister, list, show.
//!
//! These write the registry directly. A running server picks the change up
//! once its cached lookup expires; use the admin API for immediate effect.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use hookrelay_types::event::{EventRegistration, normalize_path};
use hookrelay_types::workflow::WorkflowId;

use crate::state::AppState;

/// Bind a trigger node to a path.
pub async fn register(
    state: &AppState,
    path: &str,
    workflow_id: &str,
    node: &str,
    json: bool,
) -> Result<()> {
    if path.trim_matches('/').is_empty() {
        bail!("event path must not be empty");
    }

    let registration = state
        .registry
        .register_trigger(path, &WorkflowId::new(workflow_id), node)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registration)?);
    } else {
        println!(
            "  {} '{}' of workflow {} listens on {}",
            style("✓").green().bold(),
            style(node).bold(),
            style(workflow_id).cyan(),
            style(format!("/events/{}", registration.path)).yellow()
        );
    }
    Ok(())
}

/// Unbind one trigger, or every trigger of a workflow.
pub async fn deregister(
    state: &AppState,
    workflow_id: &str,
    path: Option<&str>,
    node: Option<&str>,
    json: bool,
) -> Result<()> {
    let workflow_id = WorkflowId::new(workflow_id);

    let paths = match (path, node) {
        (Some(path), Some(node)) => {
            if state.registry.deregister_trigger(path, &workflow_id, node).await? {
                vec![normalize_path(path)]
            } else {
                Vec::new()
            }
        }
        _ => state.registry.deregister_workflow(&workflow_id).await?,
    };

    if json {
        println!(
            "{}",
            serde_json::json!({ "workflow_id": workflow_id.as_str(), "paths": paths })
        );
        return Ok(());
    }

    if paths.is_empty() {
        println!(
            "  {} Nothing registered for workflow {}",
            style("i").blue().bold(),
            style(&workflow_id).cyan()
        );
    } else {
        for path in &paths {
            println!(
                "  {} Removed workflow {} from {}",
                style("✓").green().bold(),
                style(&workflow_id).cyan(),
                style(path).yellow()
            );
        }
    }
    Ok(())
}

/// List every registration as a table.
pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let registrations = state.registry.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registrations)?);
        return Ok(());
    }

    if registrations.is_empty() {
        println!();
        println!(
            "  {} No event paths registered. Add one with: {}",
            style("i").blue().bold(),
            style("hookrelay register <path> <workflow-id> <node>").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", registration_table(&registrations));
    println!();
    println!(
        "  {} path{}",
        style(registrations.len()).bold(),
        if registrations.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Show the registration of a single path.
pub async fn show(state: &AppState, path: &str, json: bool) -> Result<()> {
    let Some(registration) = state.registry.find(path).await? else {
        bail!("no registration for path '{path}'");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&registration)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Path").bold(),
        style(format!("/events/{}", registration.path)).yellow()
    );
    println!();
    println!("{}", registration_table(std::slice::from_ref(&registration)));
    println!();
    Ok(())
}

fn registration_table(registrations: &[EventRegistration]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Path").fg(Color::White),
        Cell::new("Workflow").fg(Color::White),
        Cell::new("Trigger nodes").fg(Color::White),
    ]);

    for registration in registrations {
        for (workflow_id, nodes) in &registration.usages {
            table.add_row(vec![
                Cell::new(&registration.path).fg(Color::Yellow),
                Cell::new(workflow_id).fg(Color::Cyan),
                Cell::new(nodes.join(", ")),
            ]);
        }
    }
    table
}
