use anyhow::{Context, Result};
use chrono::Utc;
use ipnetwork::IpNetwork;
use sqlx::SqliteConnection;

use crate::models::*;
use super::helpers::map_ip_address_row;

pub struct IpAddressRepo;

impl IpAddressRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<IpAddress>> {
        let rows = sqlx::query("SELECT * FROM ip_addresses ORDER BY address, id")
            .fetch_all(&mut *conn).await?;
        rows.iter().map(map_ip_address_row).collect()
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<IpAddress>> {
        let row = sqlx::query("SELECT * FROM ip_addresses WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        row.as_ref().map(map_ip_address_row).transpose()
    }

    /// First record of `address` that is not bound to an interface. The
    /// same address may exist many times, once per interface.
    pub async fn find_unassigned(conn: &mut SqliteConnection, address: IpNetwork) -> Result<Option<IpAddress>> {
        let row = sqlx::query(
            "SELECT * FROM ip_addresses WHERE address = ? AND interface_id IS NULL ORDER BY id LIMIT 1"
        )
        .bind(address.to_string())
        .fetch_optional(&mut *conn).await?;
        row.as_ref().map(map_ip_address_row).transpose()
    }

    pub async fn find_on_interface(
        conn: &mut SqliteConnection,
        interface_id: i64,
        address: IpNetwork,
    ) -> Result<Option<IpAddress>> {
        let row = sqlx::query(
            "SELECT * FROM ip_addresses WHERE address = ? AND interface_id = ? ORDER BY id LIMIT 1"
        )
        .bind(address.to_string())
        .bind(interface_id)
        .fetch_optional(&mut *conn).await?;
        row.as_ref().map(map_ip_address_row).transpose()
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        address: IpNetwork,
        interface_id: Option<i64>,
    ) -> Result<IpAddress> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO ip_addresses (address, interface_id, created_at, updated_at) VALUES (?, ?, ?, ?)"
        )
        .bind(address.to_string())
        .bind(interface_id)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("IP address not found after creation")
    }

    pub async fn save(conn: &mut SqliteConnection, ip: &IpAddress) -> Result<IpAddress> {
        let result = sqlx::query(
            r#"UPDATE ip_addresses SET tenant_id = ?, vrf_id = ?, role = ?, interface_id = ?,
               fhrp_group_id = ?, updated_at = ? WHERE id = ?"#
        )
        .bind(ip.tenant_id)
        .bind(ip.vrf_id)
        .bind(ip.role.as_deref().unwrap_or(""))
        .bind(ip.interface_id)
        .bind(ip.fhrp_group_id)
        .bind(Utc::now())
        .bind(ip.id)
        .execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("IP address", &ip.id.to_string()).into());
        }
        Self::get(conn, ip.id).await?.context("IP address not found after update")
    }
}
