//! SQLite workflow store.
//!
//! Implements `WorkflowStore` from `hookrelay-core`. The active version,
//! static data and settings columns hold JSON text.

use chrono::Utc;
use serde_json::Value;
use sqlx::Row;

use hookrelay_core::repository::workflow::WorkflowStore;
use hookrelay_types::error::RepositoryError;
use hookrelay_types::workflow::{WorkflowId, WorkflowRecord, WorkflowShare, WorkflowVersion};

use super::pool::DatabasePool;

pub struct SqliteWorkflowStore {
    pool: DatabasePool,
}

impl SqliteWorkflowStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a workflow together with its shares.
    pub async fn save_workflow(&self, workflow: &WorkflowRecord) -> Result<(), RepositoryError> {
        let active_version = workflow
            .active_version
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("failed to serialize active version: {e}")))?;
        let static_data = encode_json(&workflow.static_data)?;
        let settings = encode_json(&workflow.settings)?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO workflows (id, name, active_version, static_data, settings, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   name = excluded.name,
                   active_version = excluded.active_version,
                   static_data = excluded.static_data,
                   settings = excluded.settings,
                   updated_at = excluded.updated_at"#,
        )
        .bind(workflow.id.as_str())
        .bind(&workflow.name)
        .bind(&active_version)
        .bind(&static_data)
        .bind(&settings)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM workflow_shares WHERE workflow_id = ?")
            .bind(workflow.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for share in &workflow.shares {
            sqlx::query("INSERT INTO workflow_shares (workflow_id, project_id, role) VALUES (?, ?, ?)")
                .bind(workflow.id.as_str())
                .bind(&share.project_id)
                .bind(&share.role)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn find_shares(&self, id: &WorkflowId) -> Result<Vec<WorkflowShare>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT project_id, role FROM workflow_shares WHERE workflow_id = ? ORDER BY project_id",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(WorkflowShare {
                    project_id: row
                        .try_get("project_id")
                        .map_err(|e| RepositoryError::Query(e.to_string()))?,
                    role: row
                        .try_get("role")
                        .map_err(|e| RepositoryError::Query(e.to_string()))?,
                })
            })
            .collect()
    }
}

fn encode_json(value: &Value) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|e| RepositoryError::Query(format!("failed to serialize JSON column: {e}")))
}

fn decode_json(column: &str, text: &str) -> Result<Value, RepositoryError> {
    serde_json::from_str(text)
        .map_err(|e| RepositoryError::Query(format!("invalid JSON in {column}: {e}")))
}

struct WorkflowRow {
    id: String,
    name: String,
    active_version: Option<String>,
    static_data: String,
    settings: String,
}

impl WorkflowRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            active_version: row.try_get("active_version")?,
            static_data: row.try_get("static_data")?,
            settings: row.try_get("settings")?,
        })
    }

    fn into_record(self, shares: Vec<WorkflowShare>) -> Result<WorkflowRecord, RepositoryError> {
        let active_version = self
            .active_version
            .as_deref()
            .map(serde_json::from_str::<WorkflowVersion>)
            .transpose()
            .map_err(|e| {
                RepositoryError::Query(format!("invalid active version for '{}': {e}", self.id))
            })?;

        Ok(WorkflowRecord {
            id: WorkflowId::new(self.id),
            name: self.name,
            active_version,
            static_data: decode_json("static_data", &self.static_data)?,
            settings: decode_json("settings", &self.settings)?,
            shares,
        })
    }
}

impl WorkflowStore for SqliteWorkflowStore {
    async fn find_workflow(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, active_version, static_data, settings FROM workflows WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let workflow_row =
            WorkflowRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let shares = self.find_shares(id).await?;
        workflow_row.into_record(shares).map(Some)
    }

    async fn save_static_data(&self, id: &WorkflowId, static_data: &Value) -> Result<(), RepositoryError> {
        let encoded = encode_json(static_data)?;

        let result = sqlx::query("UPDATE workflows SET static_data = ?, updated_at = ? WHERE id = ?")
            .bind(&encoded)
            .bind(Utc::now().to_rfc3339())
            .bind(id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::sqlite::pool::test_pool;
    use hookrelay_types::workflow::{OWNER_ROLE, WorkflowNode};

    fn workflow(id: &str, active: bool) -> WorkflowRecord {
        WorkflowRecord {
            id: WorkflowId::new(id),
            name: format!("Workflow {id}"),
            active_version: active.then(|| WorkflowVersion {
                nodes: vec![WorkflowNode {
                    name: "Trigger".to_string(),
                    node_type: "eventTrigger".to_string(),
                    type_version: 1.0,
                    parameters: json!({ "trigger": ["message"] }),
                    credentials: BTreeMap::new(),
                    disabled: false,
                }],
                connections: json!({}),
            }),
            static_data: json!({ "cursor": "c-1" }),
            settings: json!({ "timezone": "UTC" }),
            shares: vec![WorkflowShare {
                project_id: "p-owner".to_string(),
                role: OWNER_ROLE.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_save_and_find_workflow() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        let stored = workflow("wf-1", true);
        store.save_workflow(&stored).await.unwrap();

        let found = store.find_workflow(&WorkflowId::new("wf-1")).await.unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(found.owner_project_id(), Some("p-owner"));
    }

    #[tokio::test]
    async fn test_find_missing_workflow() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        assert!(store.find_workflow(&WorkflowId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_workflow_has_no_version() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        store.save_workflow(&workflow("wf-2", false)).await.unwrap();
        let found = store.find_workflow(&WorkflowId::new("wf-2")).await.unwrap().unwrap();
        assert!(found.active_version.is_none());
    }

    #[tokio::test]
    async fn test_save_static_data() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        store.save_workflow(&workflow("wf-1", true)).await.unwrap();
        store
            .save_static_data(&WorkflowId::new("wf-1"), &json!({ "cursor": "c-2" }))
            .await
            .unwrap();

        let found = store.find_workflow(&WorkflowId::new("wf-1")).await.unwrap().unwrap();
        assert_eq!(found.static_data, json!({ "cursor": "c-2" }));
    }

    #[tokio::test]
    async fn test_save_static_data_unknown_workflow() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        let err = store
            .save_static_data(&WorkflowId::new("nope"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_resave_replaces_shares() {
        let (pool, _dir) = test_pool().await;
        let store = SqliteWorkflowStore::new(pool);

        let mut stored = workflow("wf-1", true);
        store.save_workflow(&stored).await.unwrap();
        stored.shares = vec![WorkflowShare {
            project_id: "p-other".to_string(),
            role: OWNER_ROLE.to_string(),
        }];
        store.save_workflow(&stored).await.unwrap();

        let found = store.find_workflow(&WorkflowId::new("wf-1")).await.unwrap().unwrap();
        assert_eq!(found.owner_project_id(), Some("p-other"));
        assert_eq!(found.shares.len(), 1);
    }
}
