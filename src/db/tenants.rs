use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::models::*;
use super::row_helpers::map_tenant_row;

pub struct TenantRepo;

impl TenantRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Tenant>> {
        let rows = sqlx::query("SELECT * FROM tenants ORDER BY name")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.iter().map(map_tenant_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.as_ref().map(map_tenant_row))
    }

    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.as_ref().map(map_tenant_row))
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateTenantRequest) -> Result<Tenant> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(req.description.as_deref().unwrap_or(""))
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id)
            .await?
            .context("Tenant not found after creation")
    }

    /// Insert the tenant unless one with this name already exists
    pub async fn ensure(conn: &mut SqliteConnection, name: &str) -> Result<Tenant> {
        let now = Utc::now();
        sqlx::query("INSERT OR IGNORE INTO tenants (name, description, created_at, updated_at) VALUES (?, '', ?, ?)")
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        Self::find_by_name(conn, name)
            .await?
            .context("Tenant not found after creation")
    }
}
