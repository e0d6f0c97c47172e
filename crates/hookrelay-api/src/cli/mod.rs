//! CLI command definitions for the `hookrelay` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod credential;
pub mod registration;
pub mod workflow;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Route webhook events to workflow executions.
#[derive(Parser)]
#[command(name = "hookrelay", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,hookrelay=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the event receiver.
    Serve {
        /// Port to listen on (default from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Export spans to stdout through OpenTelemetry.
        #[arg(long)]
        otel: bool,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },

    /// Bind a workflow's trigger node to an event path.
    Register {
        /// Event path (leading and trailing slashes are ignored).
        path: String,

        /// Workflow ID.
        workflow_id: String,

        /// Trigger node name inside the workflow.
        node: String,
    },

    /// Unbind a workflow's triggers, everywhere or from one path.
    Deregister {
        /// Workflow ID.
        workflow_id: String,

        /// Only this path (requires --node).
        #[arg(long, requires = "node")]
        path: Option<String>,

        /// Only this trigger node (requires --path).
        #[arg(long, requires = "path")]
        node: Option<String>,
    },

    /// List event registrations.
    #[command(alias = "ls")]
    List,

    /// Show the registration of one path.
    Show {
        /// Event path.
        path: String,
    },

    /// Manage stored workflows.
    Workflow {
        #[command(subcommand)]
        action: workflow::WorkflowCommand,
    },

    /// Manage stored credentials.
    Credential {
        #[command(subcommand)]
        action: credential::CredentialCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
