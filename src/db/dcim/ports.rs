use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::row_helpers::*;
use crate::models::*;

// ========== Rear Port Repo ==========

const SELECT_REAR_PORT: &str = r#"
    SELECT rp.*, d.name AS device_name
    FROM rear_ports rp
    JOIN devices d ON d.id = rp.device_id
"#;

pub struct RearPortRepo;

impl RearPortRepo {
    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<RearPort>> {
        let row = sqlx::query(&format!("{} WHERE rp.id = ?", SELECT_REAR_PORT))
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_rear_port_row))
    }

    pub async fn list_for_device(conn: &mut SqliteConnection, device_id: i64) -> Result<Vec<RearPort>> {
        let rows = sqlx::query(&format!("{} WHERE rp.device_id = ? ORDER BY rp.name, rp.id", SELECT_REAR_PORT))
            .bind(device_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_rear_port_row).collect())
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateRearPortRequest) -> Result<RearPort> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO rear_ports (device_id, name, positions, created_at, updated_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(req.device_id)
        .bind(&req.name)
        .bind(req.positions)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Rear port not found after creation")
    }
}

// ========== Front Port Repo ==========

const SELECT_FRONT_PORT: &str = r#"
    SELECT fp.*, d.name AS device_name
    FROM front_ports fp
    JOIN devices d ON d.id = fp.device_id
"#;

pub struct FrontPortRepo;

impl FrontPortRepo {
    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<FrontPort>> {
        let row = sqlx::query(&format!("{} WHERE fp.id = ?", SELECT_FRONT_PORT))
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_front_port_row))
    }

    pub async fn list_for_device(conn: &mut SqliteConnection, device_id: i64) -> Result<Vec<FrontPort>> {
        let rows = sqlx::query(&format!("{} WHERE fp.device_id = ? ORDER BY fp.name", SELECT_FRONT_PORT))
            .bind(device_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_front_port_row).collect())
    }

    pub async fn find_by_name(conn: &mut SqliteConnection, device_id: i64, name: &str) -> Result<Option<FrontPort>> {
        let row = sqlx::query(&format!("{} WHERE fp.device_id = ? AND fp.name = ?", SELECT_FRONT_PORT))
            .bind(device_id).bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_front_port_row))
    }

    /// Front ports wired internally to a rear port, in position order
    pub async fn list_for_rear_port(conn: &mut SqliteConnection, rear_port_id: i64) -> Result<Vec<FrontPort>> {
        let rows = sqlx::query(&format!(
            "{} WHERE fp.rear_port_id = ? ORDER BY fp.rear_port_position, fp.id",
            SELECT_FRONT_PORT
        ))
        .bind(rear_port_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_front_port_row).collect())
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateFrontPortRequest) -> Result<FrontPort> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO front_ports (device_id, name, rear_port_id, rear_port_position, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#
        )
        .bind(req.device_id)
        .bind(&req.name)
        .bind(req.rear_port_id)
        .bind(req.rear_port_position)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Front port not found after creation")
    }
}
