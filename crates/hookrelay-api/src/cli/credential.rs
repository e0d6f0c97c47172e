//! Credential CLI commands: add.

use anyhow::{Result, bail};
use console::style;
use serde_json::{Map, Value};

use hookrelay_types::credential::CredentialData;

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum CredentialCommand {
    /// Store a credential for a project.
    Add {
        /// Display name.
        name: String,

        /// Credential type (e.g. slackApi).
        #[arg(long = "type")]
        credential_type: String,

        /// Owning project ID.
        #[arg(long)]
        project: Option<String>,

        /// Field as KEY=VALUE (repeatable), e.g. signatureSecret=...
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

pub async fn handle_credential_command(action: CredentialCommand, state: &AppState, json: bool) -> Result<()> {
    match action {
        CredentialCommand::Add {
            name,
            credential_type,
            project,
            fields,
        } => {
            let data = parse_fields(&fields)?;
            let id = state
                .credentials
                .save_credential(&name, &credential_type, project.as_deref(), &data)
                .await?;

            if json {
                println!(
                    "{}",
                    serde_json::json!({ "id": id, "type": credential_type, "fields": data.0.keys().collect::<Vec<_>>() })
                );
            } else {
                println!(
                    "  {} Credential '{}' stored ({}, {})",
                    style("✓").green().bold(),
                    style(&name).bold(),
                    style(&credential_type).cyan(),
                    style(&id).dim()
                );
            }
            Ok(())
        }
    }
}

/// Parse `KEY=VALUE` pairs into credential fields. Values are kept as strings.
pub fn parse_fields(pairs: &[String]) -> Result<CredentialData> {
    if pairs.is_empty() {
        bail!("at least one --field KEY=VALUE is required");
    }
    let mut fields = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("field '{pair}' is not KEY=VALUE");
        };
        if key.is_empty() {
            bail!("field '{pair}' has an empty key");
        }
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(CredentialData::new(fields))
}
