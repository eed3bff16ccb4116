use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::row_helpers::*;
use crate::models::*;

const SELECT_INTERFACE: &str = r#"
    SELECT i.*,
           d.name AS device_name,
           (SELECT GROUP_CONCAT(tv.vlan_id, ',') FROM interface_tagged_vlans tv WHERE tv.interface_id = i.id) AS tagged_vlan_ids_csv
    FROM interfaces i
    JOIN devices d ON d.id = i.device_id
"#;

pub struct InterfaceRepo;

impl InterfaceRepo {
    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Interface>> {
        let row = sqlx::query(&format!("{} WHERE i.id = ?", SELECT_INTERFACE))
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_interface_row))
    }

    pub async fn list_for_device(conn: &mut SqliteConnection, device_id: i64) -> Result<Vec<Interface>> {
        let rows = sqlx::query(&format!("{} WHERE i.device_id = ? ORDER BY i.name", SELECT_INTERFACE))
            .bind(device_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_interface_row).collect())
    }

    /// Interfaces of a device that have no LAG members, i.e. leaf
    /// physical interfaces rather than aggregates
    pub async fn list_without_members(conn: &mut SqliteConnection, device_id: i64) -> Result<Vec<Interface>> {
        let rows = sqlx::query(&format!(
            "{} WHERE i.device_id = ? AND NOT EXISTS (SELECT 1 FROM interfaces m WHERE m.lag_id = i.id) ORDER BY i.name",
            SELECT_INTERFACE
        ))
        .bind(device_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_interface_row).collect())
    }

    pub async fn find_by_name(conn: &mut SqliteConnection, device_id: i64, name: &str) -> Result<Option<Interface>> {
        let row = sqlx::query(&format!("{} WHERE i.device_id = ? AND i.name = ?", SELECT_INTERFACE))
            .bind(device_id).bind(name).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_interface_row))
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateInterfaceRequest) -> Result<Interface> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO interfaces (device_id, name, type, enabled, parent_id, lag_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.device_id)
        .bind(&req.name)
        .bind(&req.iface_type)
        .bind(if req.enabled { 1i32 } else { 0i32 })
        .bind(req.parent_id)
        .bind(req.lag_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Interface not found after creation")
    }

    /// Persist every mutable field of an interface, replacing its tagged VLAN set
    pub async fn save(conn: &mut SqliteConnection, iface: &Interface) -> Result<Interface> {
        let result = sqlx::query(
            r#"
            UPDATE interfaces SET type = ?, enabled = ?, mode = ?, untagged_vlan_id = ?,
                parent_id = ?, lag_id = ?, vrf_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&iface.iface_type)
        .bind(if iface.enabled { 1i32 } else { 0i32 })
        .bind(iface.mode.map(|m| m.as_str()).unwrap_or(""))
        .bind(iface.untagged_vlan_id)
        .bind(iface.parent_id)
        .bind(iface.lag_id)
        .bind(iface.vrf_id)
        .bind(Utc::now())
        .bind(iface.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("Interface", &iface.id.to_string()).into());
        }

        sqlx::query("DELETE FROM interface_tagged_vlans WHERE interface_id = ?")
            .bind(iface.id)
            .execute(&mut *conn)
            .await?;
        for vlan_id in &iface.tagged_vlan_ids {
            sqlx::query("INSERT OR IGNORE INTO interface_tagged_vlans (interface_id, vlan_id) VALUES (?, ?)")
                .bind(iface.id)
                .bind(*vlan_id)
                .execute(&mut *conn)
                .await?;
        }

        Self::get(conn, iface.id).await?.context("Interface not found after update")
    }
}
