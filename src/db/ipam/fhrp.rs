use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::models::*;
use super::helpers::*;

const SELECT_FHRP_GROUP: &str = r#"
    SELECT g.*,
           (SELECT GROUP_CONCAT(ip.address, ',') FROM ip_addresses ip WHERE ip.fhrp_group_id = g.id) AS ip_addresses_csv
    FROM fhrp_groups g
"#;

// ========== FHRP Group Repo ==========

pub struct FhrpGroupRepo;

impl FhrpGroupRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<FhrpGroup>> {
        let rows = sqlx::query(&format!("{} ORDER BY g.group_id, g.name", SELECT_FHRP_GROUP))
            .fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_fhrp_group_row).collect())
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<FhrpGroup>> {
        let row = sqlx::query(&format!("{} WHERE g.id = ?", SELECT_FHRP_GROUP))
            .bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_fhrp_group_row))
    }

    /// Groups are identified by the (name, group id, protocol) triple
    pub async fn find(
        conn: &mut SqliteConnection,
        name: &str,
        group_id: i32,
        protocol: &str,
    ) -> Result<Option<FhrpGroup>> {
        let row = sqlx::query(&format!(
            "{} WHERE g.name = ? AND g.group_id = ? AND g.protocol = ?",
            SELECT_FHRP_GROUP
        ))
        .bind(name).bind(group_id).bind(protocol)
        .fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_fhrp_group_row))
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        name: &str,
        group_id: i32,
        protocol: &str,
    ) -> Result<FhrpGroup> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO fhrp_groups (name, group_id, protocol, created_at, updated_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(name).bind(group_id).bind(protocol)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        Self::get(conn, new_id).await?.context("FHRP group not found after creation")
    }
}

// ========== FHRP Group Assignment Repo ==========

pub struct FhrpAssignmentRepo;

impl FhrpAssignmentRepo {
    pub async fn find(
        conn: &mut SqliteConnection,
        group_id: i64,
        interface_id: i64,
    ) -> Result<Option<FhrpGroupAssignment>> {
        let row = sqlx::query("SELECT * FROM fhrp_group_assignments WHERE group_id = ? AND interface_id = ?")
            .bind(group_id).bind(interface_id)
            .fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(map_fhrp_assignment_row))
    }

    pub async fn list_for_group(conn: &mut SqliteConnection, group_id: i64) -> Result<Vec<FhrpGroupAssignment>> {
        let rows = sqlx::query("SELECT * FROM fhrp_group_assignments WHERE group_id = ? ORDER BY id")
            .bind(group_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(map_fhrp_assignment_row).collect())
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        group_id: i64,
        interface_id: i64,
        priority: i32,
    ) -> Result<FhrpGroupAssignment> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO fhrp_group_assignments (group_id, interface_id, priority, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#
        )
        .bind(group_id).bind(interface_id).bind(priority)
        .bind(now).bind(now)
        .execute(&mut *conn).await?;
        let new_id = result.last_insert_rowid();
        let row = sqlx::query("SELECT * FROM fhrp_group_assignments WHERE id = ?")
            .bind(new_id).fetch_one(&mut *conn).await?;
        Ok(map_fhrp_assignment_row(&row))
    }

    pub async fn save(conn: &mut SqliteConnection, assignment: &FhrpGroupAssignment) -> Result<()> {
        sqlx::query("UPDATE fhrp_group_assignments SET priority = ?, updated_at = ? WHERE id = ?")
            .bind(assignment.priority)
            .bind(Utc::now())
            .bind(assignment.id)
            .execute(&mut *conn).await?;
        Ok(())
    }
}
