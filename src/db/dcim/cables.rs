use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::row_helpers::*;
use crate::models::*;

pub struct CableRepo;

impl CableRepo {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Cable>> {
        let rows = sqlx::query("SELECT * FROM cables ORDER BY id")
            .fetch_all(&mut *conn).await?;
        let mut cables: Vec<Cable> = rows.iter().map(map_cable_row).collect();
        for cable in cables.iter_mut() {
            Self::load_terminations(conn, cable).await?;
        }
        Ok(cables)
    }

    pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Cable>> {
        let row = sqlx::query("SELECT * FROM cables WHERE id = ?")
            .bind(id).fetch_optional(&mut *conn).await?;
        match row.as_ref().map(map_cable_row) {
            Some(mut cable) => {
                Self::load_terminations(conn, &mut cable).await?;
                Ok(Some(cable))
            }
            None => Ok(None),
        }
    }

    async fn load_terminations(conn: &mut SqliteConnection, cable: &mut Cable) -> Result<()> {
        let rows = sqlx::query("SELECT * FROM cable_terminations WHERE cable_id = ? ORDER BY id")
            .bind(cable.id).fetch_all(&mut *conn).await?;
        for row in &rows {
            match map_termination_row(row)? {
                (CableEnd::A, term) => cable.a_terminations.push(term),
                (CableEnd::B, term) => cable.b_terminations.push(term),
            }
        }
        Ok(())
    }

    /// Id of the cable attached to an endpoint, if any
    pub async fn find_for_termination(conn: &mut SqliteConnection, term: Termination) -> Result<Option<i64>> {
        let cable_id: Option<i64> = sqlx::query_scalar(
            "SELECT cable_id FROM cable_terminations WHERE termination_type = ? AND termination_id = ?"
        )
        .bind(term.kind.as_str())
        .bind(term.id)
        .fetch_optional(&mut *conn).await?;
        Ok(cable_id)
    }

    /// Endpoints on the far end of the cable attached to `term`. Empty when
    /// the endpoint is not cabled.
    pub async fn peers(conn: &mut SqliteConnection, term: Termination) -> Result<Vec<Termination>> {
        let rows = sqlx::query(
            r#"
            SELECT far.*
            FROM cable_terminations near
            JOIN cable_terminations far ON far.cable_id = near.cable_id AND far.cable_end <> near.cable_end
            WHERE near.termination_type = ? AND near.termination_id = ?
            ORDER BY far.id
            "#,
        )
        .bind(term.kind.as_str())
        .bind(term.id)
        .fetch_all(&mut *conn).await?;

        rows.iter()
            .map(|row| map_termination_row(row).map(|(_, t)| t))
            .collect()
    }

    pub async fn create(conn: &mut SqliteConnection, req: &CreateCableRequest) -> Result<Cable> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO cables (status, type, color, length, length_unit, tenant_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.status)
        .bind(&req.cable_type)
        .bind(&req.color)
        .bind(&req.length)
        .bind(&req.length_unit)
        .bind(req.tenant_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let cable_id = result.last_insert_rowid();
        let ends = req.a_terminations.iter().map(|t| (CableEnd::A, t))
            .chain(req.b_terminations.iter().map(|t| (CableEnd::B, t)));
        for (end, term) in ends {
            sqlx::query(
                "INSERT INTO cable_terminations (cable_id, cable_end, termination_type, termination_id) VALUES (?, ?, ?, ?)"
            )
            .bind(cable_id)
            .bind(end.as_str())
            .bind(term.kind.as_str())
            .bind(term.id)
            .execute(&mut *conn)
            .await?;
        }

        Self::get(conn, cable_id).await?.context("Cable not found after creation")
    }
}
