//! SQLite execution records.
//!
//! Persists started runs with their execution data and tracks status
//! transitions (`running` -> `success` | `error`, `waiting` -> `running`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;

use hookrelay_types::error::RepositoryError;
use hookrelay_types::execution::{ExecutionId, RunRequest};
use hookrelay_types::workflow::WorkflowId;

use super::pool::DatabasePool;

/// Lifecycle status of a stored execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Waiting,
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Waiting => "waiting",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Error)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ExecutionStatus::Running),
            "waiting" => Ok(ExecutionStatus::Waiting),
            "success" => Ok(ExecutionStatus::Success),
            "error" => Ok(ExecutionStatus::Error),
            other => Err(RepositoryError::Query(format!(
                "unknown execution status '{other}'"
            ))),
        }
    }
}

/// A stored execution without its execution data.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub mode: String,
    pub status: ExecutionStatus,
    pub parent_execution_id: Option<ExecutionId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct ExecutionRow {
    id: String,
    workflow_id: String,
    mode: String,
    status: String,
    parent_execution_id: Option<String>,
    started_at: String,
    finished_at: Option<String>,
}

impl ExecutionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            workflow_id: row.try_get("workflow_id")?,
            mode: row.try_get("mode")?,
            status: row.try_get("status")?,
            parent_execution_id: row.try_get("parent_execution_id")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
        })
    }

    fn into_summary(self) -> Result<ExecutionSummary, RepositoryError> {
        Ok(ExecutionSummary {
            id: ExecutionId::new(self.id),
            workflow_id: WorkflowId::new(self.workflow_id),
            mode: self.mode,
            status: self.status.parse()?,
            parent_execution_id: self.parent_execution_id.map(ExecutionId::new),
            started_at: parse_timestamp(&self.started_at)?,
            finished_at: self.finished_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid timestamp '{s}': {e}")))
}

#[derive(Clone)]
pub struct SqliteExecutionStore {
    pool: DatabasePool,
}

impl SqliteExecutionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a new execution for a run request.
    pub async fn insert(
        &self,
        id: &ExecutionId,
        run: &RunRequest,
        status: ExecutionStatus,
    ) -> Result<(), RepositoryError> {
        let execution_data = serde_json::to_string(&run.execution_data)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize execution data: {e}")))?;
        let parent_id = run
            .execution_data
            .parent_execution
            .as_ref()
            .map(|p| p.execution_id.as_str());

        sqlx::query(
            r#"INSERT INTO executions
               (id, workflow_id, mode, status, execution_data, project_id, push_ref, parent_execution_id, started_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.as_str())
        .bind(run.workflow.id.as_str())
        .bind(run.mode.to_string())
        .bind(status.as_str())
        .bind(&execution_data)
        .bind(run.project_id.as_deref())
        .bind(run.push_ref.as_deref())
        .bind(parent_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("execution {id} already exists"))
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(())
    }

    /// Move an execution to a new status. Finished statuses stamp `finished_at`.
    pub async fn set_status(&self, id: &ExecutionId, status: ExecutionStatus) -> Result<(), RepositoryError> {
        let finished_at = status.is_finished().then(|| Utc::now().to_rfc3339());

        let result = sqlx::query("UPDATE executions SET status = ?, finished_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(finished_at)
            .bind(id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Atomically move an execution from one status to another. Returns
    /// `false` when the execution is missing or not in the expected status.
    pub async fn transition(
        &self,
        id: &ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE executions SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(id.as_str())
            .bind(from.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(&self, id: &ExecutionId) -> Result<Option<ExecutionSummary>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT id, workflow_id, mode, status, parent_execution_id, started_at, finished_at
               FROM executions WHERE id = ?"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => ExecutionRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_summary()
                .map(Some),
            None => Ok(None),
        }
    }

    /// Most recent executions of a workflow, newest first.
    pub async fn list_for_workflow(
        &self,
        workflow_id: &WorkflowId,
        limit: i64,
    ) -> Result<Vec<ExecutionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, workflow_id, mode, status, parent_execution_id, started_at, finished_at
               FROM executions WHERE workflow_id = ?
               ORDER BY started_at DESC, id DESC
               LIMIT ?"#,
        )
        .bind(workflow_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                ExecutionRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_summary()
            })
            .collect()
    }
}
