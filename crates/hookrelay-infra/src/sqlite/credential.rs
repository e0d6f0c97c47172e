//! SQLite credential resolver.
//!
//! Credential fields are stored as a JSON object per row. A node's explicit
//! credential id wins; otherwise the oldest credential of the requested type
//! owned by the workflow's project is used.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::Row;
use uuid::Uuid;

use hookrelay_core::repository::credential::CredentialResolver;
use hookrelay_types::credential::{CredentialData, CredentialRequest};
use hookrelay_types::error::CredentialError;

use super::pool::DatabasePool;

pub struct SqliteCredentialResolver {
    pool: DatabasePool,
}

impl SqliteCredentialResolver {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Store a credential and return its generated id.
    pub async fn save_credential(
        &self,
        name: &str,
        credential_type: &str,
        project_id: Option<&str>,
        data: &CredentialData,
    ) -> Result<String, CredentialError> {
        let id = Uuid::now_v7().to_string();
        let encoded = serde_json::to_string(data)
            .map_err(|e| CredentialError::Store(format!("failed to serialize credential: {e}")))?;

        sqlx::query(
            r#"INSERT INTO credentials (id, name, credential_type, project_id, data, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(name)
        .bind(credential_type)
        .bind(project_id)
        .bind(&encoded)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| CredentialError::Store(e.to_string()))?;

        Ok(id)
    }
}

fn decode(id: &str, text: &str) -> Result<CredentialData, CredentialError> {
    let fields: Map<String, Value> =
        serde_json::from_str(text).map_err(|_| CredentialError::Malformed(id.to_string()))?;
    Ok(CredentialData::new(fields))
}

impl CredentialResolver for SqliteCredentialResolver {
    async fn resolve(&self, request: &CredentialRequest) -> Result<Option<CredentialData>, CredentialError> {
        let row = match &request.credential_id {
            Some(credential_id) => {
                sqlx::query("SELECT id, data FROM credentials WHERE id = ? AND credential_type = ?")
                    .bind(credential_id)
                    .bind(&request.credential_type)
                    .fetch_optional(&self.pool.reader)
                    .await
            }
            None => {
                sqlx::query(
                    r#"SELECT id, data FROM credentials
                       WHERE credential_type = ? AND project_id IS ?
                       ORDER BY created_at, id
                       LIMIT 1"#,
                )
                .bind(&request.credential_type)
                .bind(request.project_id.as_deref())
                .fetch_optional(&self.pool.reader)
                .await
            }
        }
        .map_err(|e| CredentialError::Store(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row
            .try_get("id")
            .map_err(|e| CredentialError::Store(e.to_string()))?;
        let data: String = row
            .try_get("data")
            .map_err(|e| CredentialError::Store(e.to_string()))?;

        decode(&id, &data).map(Some)
    }
}
