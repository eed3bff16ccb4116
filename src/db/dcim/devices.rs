use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::row_helpers::*;
use crate::models::*;

const SELECT_DEVICE: &str = r#"
    SELECT d.*,
           dt.model AS device_type,
           r.name AS role
    FROM devices d
    JOIN device_types dt ON dt.id = d.device_type_id
    JOIN device_roles r ON r.id = d.role_id
"#;

pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Device>> {
        let rows = sqlx::query(&format!("{} ORDER BY d.name", SELECT_DEVICE))
            .fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_device_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Device>> {
        let row = sqlx::query(&format!("{} WHERE d.id = ?", SELECT_DEVICE))
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_device_row))
    }

    pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Device>> {
        let row = sqlx::query(&format!("{} WHERE d.name = ?", SELECT_DEVICE))
            .bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_device_row))
    }

    /// Devices of one type in any of the given locations, ordered by name
    pub async fn list_by_type_in_locations(
        conn: &mut SqliteConnection,
        device_type_id: i64,
        location_ids: &[i64],
    ) -> Result<Vec<Device>> {
        if location_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{} WHERE d.device_type_id = ? AND d.location_id IN ({}) ORDER BY d.name",
            SELECT_DEVICE,
            placeholders(location_ids.len())
        );
        let mut query = sqlx::query(&sql).bind(device_type_id);
        for id in location_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_device_row).collect())
    }

    /// Devices with a role (case-insensitive) mounted in a rack at any of
    /// the given positions
    pub async fn list_in_rack_with_role(
        conn: &mut SqliteConnection,
        rack_id: i64,
        role: &str,
        positions: &[i32],
    ) -> Result<Vec<Device>> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{} WHERE d.rack_id = ? AND r.name = ? COLLATE NOCASE AND d.position IN ({}) ORDER BY d.name",
            SELECT_DEVICE,
            placeholders(positions.len())
        );
        let mut query = sqlx::query(&sql).bind(rack_id).bind(role);
        for pos in positions {
            query = query.bind(*pos);
        }
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_device_row).collect())
    }

    pub async fn list_by_role(conn: &mut SqliteConnection, role: &str) -> Result<Vec<Device>> {
        let rows = sqlx::query(&format!("{} WHERE r.name = ? COLLATE NOCASE ORDER BY d.name", SELECT_DEVICE))
            .bind(role).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_device_row).collect())
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        req: &CreateDeviceRequest,
        device_type_id: i64,
        role_id: i64,
    ) -> Result<Device> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO devices (name, device_type_id, role_id, location_id, rack_id, position, tenant_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(device_type_id)
        .bind(role_id)
        .bind(req.location_id)
        .bind(req.rack_id)
        .bind(req.position)
        .bind(req.tenant_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id)
            .await?
            .context("Device not found after creation")
    }

    pub async fn update_tenant(conn: &mut SqliteConnection, id: i64, tenant_id: Option<i64>) -> Result<()> {
        let result = sqlx::query("UPDATE devices SET tenant_id = ?, updated_at = ? WHERE id = ?")
            .bind(tenant_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("Device", &id.to_string()).into());
        }
        Ok(())
    }
}
