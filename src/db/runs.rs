use anyhow::Result;
use sqlx::{Row, SqliteConnection, sqlite::SqliteRow};

use crate::models::*;
use super::row_helpers::none_if_empty;

fn map_run_row(row: &SqliteRow) -> Result<ProvisionRun> {
    let log: String = row.get("log");
    Ok(ProvisionRun {
        id: row.get("id"),
        operation: row.get("operation"),
        status: row.get("status"),
        summary: row.get("summary"),
        error: none_if_empty(row.get("error")),
        log: serde_json::from_str(&log)?,
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    })
}

pub struct RunRepo;

impl RunRepo {
    /// Most recent runs first
    pub async fn list(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<ProvisionRun>> {
        let rows = sqlx::query("SELECT * FROM provision_runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;
        rows.iter().map(map_run_row).collect()
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> Result<Option<ProvisionRun>> {
        let row = sqlx::query("SELECT * FROM provision_runs WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(map_run_row).transpose()
    }

    pub async fn record(conn: &mut SqliteConnection, run: &ProvisionRun) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO provision_runs (id, operation, status, summary, error, log, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.operation)
        .bind(&run.status)
        .bind(&run.summary)
        .bind(run.error.as_deref().unwrap_or(""))
        .bind(serde_json::to_string(&run.log)?)
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
