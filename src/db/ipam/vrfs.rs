use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::models::*;
use super::helpers::*;

pub struct VrfRepo;

impl VrfRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Vrf>> {
        let rows = sqlx::query("SELECT * FROM vrfs ORDER BY name")
            .fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_vrf_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Vrf>> {
        let row = sqlx::query("SELECT * FROM vrfs WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_vrf_row))
    }

    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Vrf>> {
        let row = sqlx::query("SELECT * FROM vrfs WHERE name = ?")
            .bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_vrf_row))
    }

    pub async fn create(conn: &mut SqliteConnection, name: &str) -> Result<Vrf> {
        let now = Utc::now();
        let result = sqlx::query("INSERT INTO vrfs (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name).bind(now).bind(now)
            .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("VRF not found after creation")
    }

    pub async fn save(conn: &mut SqliteConnection, vrf: &Vrf) -> Result<Vrf> {
        let result = sqlx::query("UPDATE vrfs SET tenant_id = ?, updated_at = ? WHERE id = ?")
            .bind(vrf.tenant_id)
            .bind(Utc::now())
            .bind(vrf.id)
            .execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("VRF", &vrf.id.to_string()).into());
        }
        Self::get(conn, vrf.id).await?.context("VRF not found after update")
    }
}
