use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::row_helpers::*;
use crate::models::*;
use crate::utils::slugify;

// ========== Location Repo ==========

pub struct LocationRepo;

impl LocationRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Location>> {
        let rows = sqlx::query("SELECT * FROM locations ORDER BY name")
            .fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_location_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Location>> {
        let row = sqlx::query("SELECT * FROM locations WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_location_row))
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateLocationRequest) -> Result<Location> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO locations (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)"
        )
        .bind(&req.name)
        .bind(req.description.as_deref().unwrap_or(""))
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Location not found after creation")
    }
}

// ========== Rack Repo ==========

pub struct RackRepo;

impl RackRepo {
    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Rack>> {
        let row = sqlx::query("SELECT * FROM racks WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_rack_row))
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateRackRequest) -> Result<Rack> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO racks (name, location_id, created_at, updated_at) VALUES (?, ?, ?, ?)"
        )
        .bind(&req.name)
        .bind(req.location_id)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Rack not found after creation")
    }
}

// ========== Device Type Repo ==========

pub struct DeviceTypeRepo;

impl DeviceTypeRepo {
    pub async fn find_by_model(conn: &mut SqliteConnection, model: &str) -> Result<Option<DeviceType>> {
        let row = sqlx::query("SELECT * FROM device_types WHERE model = ?")
            .bind(model).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_device_type_row))
    }

    /// Insert the device type unless one with this model already exists
    pub async fn ensure(conn: &mut SqliteConnection, model: &str) -> Result<DeviceType> {
        sqlx::query("INSERT OR IGNORE INTO device_types (model, slug) VALUES (?, ?)")
            .bind(model)
            .bind(slugify(model))
            .execute(&mut *conn).await?;
        Self::find_by_model(conn, model).await?.context("Device type not found after creation")
    }
}

// ========== Device Role Repo ==========

pub struct DeviceRoleRepo;

impl DeviceRoleRepo {
    /// Roles are matched case-insensitively (name column is COLLATE NOCASE)
    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<DeviceRole>> {
        let row = sqlx::query("SELECT * FROM device_roles WHERE name = ?")
            .bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_device_role_row))
    }

    pub async fn ensure(conn: &mut SqliteConnection, name: &str) -> Result<DeviceRole> {
        sqlx::query("INSERT OR IGNORE INTO device_roles (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(slugify(name))
            .execute(&mut *conn).await?;
        Self::find_by_name(conn, name).await?.context("Device role not found after creation")
    }
}
