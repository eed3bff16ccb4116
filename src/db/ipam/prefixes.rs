use anyhow::{Context, Result};
use chrono::Utc;
use ipnetwork::IpNetwork;
use sqlx::SqliteConnection;

use crate::models::*;
use crate::utils;
use super::helpers::map_prefix_row;

pub struct PrefixRepo;

impl PrefixRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Prefix>> {
        let rows = sqlx::query("SELECT * FROM prefixes ORDER BY prefix")
            .fetch_all(&mut *conn).await?;
        rows.iter().map(map_prefix_row).collect()
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Prefix>> {
        let row = sqlx::query("SELECT * FROM prefixes WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        row.as_ref().map(map_prefix_row).transpose()
    }

    /// Look a prefix up by its canonical network form
    pub async fn find_by_network(conn: &mut SqliteConnection, network: IpNetwork) -> Result<Option<Prefix>> {
        let canonical = utils::canonical_network(network);
        let row = sqlx::query("SELECT * FROM prefixes WHERE prefix = ?")
            .bind(canonical.to_string()).fetch_optional(&mut *conn).await?;
        row.as_ref().map(map_prefix_row).transpose()
    }

    pub async fn create(conn: &mut SqliteConnection, network: IpNetwork) -> Result<Prefix> {
        let canonical = utils::canonical_network(network);
        let now = Utc::now();
        let result = sqlx::query("INSERT INTO prefixes (prefix, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(canonical.to_string())
            .bind(now).bind(now)
            .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("Prefix not found after creation")
    }

    pub async fn save(conn: &mut SqliteConnection, prefix: &Prefix) -> Result<Prefix> {
        let result = sqlx::query(
            "UPDATE prefixes SET tenant_id = ?, vrf_id = ?, vlan_id = ?, role = ?, updated_at = ? WHERE id = ?"
        )
        .bind(prefix.tenant_id)
        .bind(prefix.vrf_id)
        .bind(prefix.vlan_id)
        .bind(prefix.role.as_deref().unwrap_or(""))
        .bind(Utc::now())
        .bind(prefix.id)
        .execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::NotFoundError::new("Prefix", &prefix.id.to_string()).into());
        }
        Self::get(conn, prefix.id).await?.context("Prefix not found after update")
    }
}
