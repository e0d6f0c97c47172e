//! SQLite event registry.
//!
//! Implements `EventRepository` from `hookrelay-core`. Usages are stored as a
//! JSON object keyed by workflow id.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::Row;

use hookrelay_core::repository::event::EventRepository;
use hookrelay_types::error::RepositoryError;
use hookrelay_types::event::EventRegistration;
use hookrelay_types::workflow::WorkflowId;

use super::pool::DatabasePool;

pub struct SqliteEventRepository {
    pool: DatabasePool,
}

impl SqliteEventRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct RegistrationRow {
    path: String,
    usages: String,
}

impl RegistrationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            path: row.try_get("path")?,
            usages: row.try_get("usages")?,
        })
    }

    fn into_registration(self) -> Result<EventRegistration, RepositoryError> {
        let usages: BTreeMap<WorkflowId, Vec<String>> = serde_json::from_str(&self.usages)
            .map_err(|e| RepositoryError::Query(format!("invalid usages JSON for '{}': {e}", self.path)))?;
        Ok(EventRegistration {
            path: self.path,
            usages,
        })
    }
}

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<EventRegistration>, RepositoryError> {
    rows.iter()
        .map(|row| {
            RegistrationRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_registration()
        })
        .collect()
}

impl EventRepository for SqliteEventRepository {
    async fn find_by_path(&self, path: &str) -> Result<Option<EventRegistration>, RepositoryError> {
        let row = sqlx::query("SELECT path, usages FROM event_registrations WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let registration = RegistrationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_registration()?;
                Ok(Some(registration))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, registration: &EventRegistration) -> Result<(), RepositoryError> {
        let usages = serde_json::to_string(&registration.usages)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize usages: {e}")))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO event_registrations (path, usages, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (path) DO UPDATE SET usages = excluded.usages, updated_at = excluded.updated_at"#,
        )
        .bind(&registration.path)
        .bind(&usages)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM event_registrations WHERE path = ?")
            .bind(path)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<EventRegistration>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT path, usages FROM event_registrations
               WHERE EXISTS (SELECT 1 FROM json_each(event_registrations.usages) WHERE json_each.key = ?)
               ORDER BY path"#,
        )
        .bind(workflow_id.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_rows(&rows)
    }

    async fn list(&self) -> Result<Vec<EventRegistration>, RepositoryError> {
        let rows = sqlx::query("SELECT path, usages FROM event_registrations ORDER BY path")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_rows(&rows)
    }
}
