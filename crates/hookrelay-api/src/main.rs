//! hookrelay CLI and event receiver entry point.
//!
//! Binary name: `hookrelay`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the HTTP server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use hookrelay_observe::{LogFormat, TracingOptions, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "hookrelay", &mut std::io::stdout());
        return Ok(());
    }

    let (enable_otel, log_json) = match &cli.command {
        Commands::Serve { otel, log_json, .. } => (*otel, *log_json),
        _ => (false, false),
    };
    let options = TracingOptions::new(cli.log_filter())
        .with_format(if log_json { LogFormat::Json } else { LogFormat::Pretty })
        .with_otel(enable_otel)
        .with_span_timings(cli.verbose > 1);
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init().await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host, .. } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} hookrelay listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}/events/")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(%addr, data_dir = %state.data_dir.display(), "server started");

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Register {
            path,
            workflow_id,
            node,
        } => {
            cli::registration::register(&state, &path, &workflow_id, &node, cli.json).await?;
        }

        Commands::Deregister {
            workflow_id,
            path,
            node,
        } => {
            cli::registration::deregister(
                &state,
                &workflow_id,
                path.as_deref(),
                node.as_deref(),
                cli.json,
            )
            .await?;
        }

        Commands::List => {
            cli::registration::list(&state, cli.json).await?;
        }

        Commands::Show { path } => {
            cli::registration::show(&state, &path, cli.json).await?;
        }

        Commands::Workflow { action } => {
            cli::workflow::handle_workflow_command(action, &state, cli.json).await?;
        }

        Commands::Credential { action } => {
            cli::credential::handle_credential_command(action, &state, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
