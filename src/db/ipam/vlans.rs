use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::models::*;
use super::helpers::*;

// ========== VLAN Group Repo ==========

pub struct VlanGroupRepo;

impl VlanGroupRepo {
    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<VlanGroup>> {
        let row = sqlx::query("SELECT * FROM vlan_groups WHERE name = ?")
            .bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_vlan_group_row))
    }

    /// Insert the group unless one with this name already exists
    pub async fn ensure(conn: &mut SqliteConnection, name: &str) -> Result<VlanGroup> {
        let now = Utc::now();
        sqlx::query("INSERT OR IGNORE INTO vlan_groups (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name).bind(now).bind(now)
            .execute(&mut *conn).await?;
        Self::find_by_name(conn, name).await?.context("VLAN group not found after creation")
    }
}

// ========== VLAN Repo ==========

pub struct VlanRepo;

impl VlanRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Vlan>> {
        let rows = sqlx::query("SELECT * FROM vlans ORDER BY vid")
            .fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_vlan_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Vlan>> {
        let row = sqlx::query("SELECT * FROM vlans WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_vlan_row))
    }

    pub async fn find_by_vid(conn: &mut SqliteConnection, vid: u16) -> Result<Option<Vlan>> {
        let row = sqlx::query("SELECT * FROM vlans WHERE vid = ?")
            .bind(vid as i64).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_vlan_row))
    }

    pub async fn create(conn: &mut SqliteConnection, vid: u16, name: &str) -> Result<Vlan> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO vlans (vid, name, created_at, updated_at) VALUES (?, ?, ?, ?)"
        )
        .bind(vid as i64)
        .bind(name)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("VLAN not found after creation")
    }

    pub async fn save(conn: &mut SqliteConnection, vlan: &Vlan) -> Result<Vlan> {
        let result = sqlx::query(
            "UPDATE vlans SET name = ?, tenant_id = ?, group_id = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&vlan.name)
        .bind(vlan.tenant_id)
        .bind(vlan.group_id)
        .bind(Utc::now())
        .bind(vlan.id)
        .execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("VLAN", &vlan.id.to_string()).into());
        }
        Self::get(conn, vlan.id).await?.context("VLAN not found after update")
    }
}
