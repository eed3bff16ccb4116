use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::*;
use crate::provision::Operation;
use crate::AppState;

use super::{ApiError, LimitQuery};

/// Infer and create the panel-to-switch cables of the given locations
pub async fn connect_cables(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectCablesRequest>,
) -> Result<Json<ProvisionRun>, ApiError> {
    tracing::info!(user = user.claims.username.as_str(), "Connect cables requested");
    let run = state.provisioner.run(Operation::ConnectCables(&req)).await?;
    Ok(Json(run))
}

/// Provision a VLAN with its VRF, prefixes and exit-switch gateways
pub async fn create_vlan(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVlanRequest>,
) -> Result<Json<ProvisionRun>, ApiError> {
    tracing::info!(
        user = user.claims.username.as_str(),
        "Create VLAN {} ({}) requested",
        req.vlan_name,
        req.vlan_id
    );
    let run = state.provisioner.run(Operation::CreateVlan(&req)).await?;
    Ok(Json(run))
}

pub async fn set_vlan_membership(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetVlanRequest>,
) -> Result<Json<ProvisionRun>, ApiError> {
    tracing::info!(user = user.claims.username.as_str(), "VLAN membership change requested");
    let run = state.provisioner.run(Operation::SetVlanMembership(&req)).await?;
    Ok(Json(run))
}

/// List recent provisioning runs, newest first
pub async fn list_runs(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ProvisionRun>>, ApiError> {
    let runs = state.store.list_runs(query.sanitize()).await?;
    Ok(Json(runs))
}

pub async fn get_run(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProvisionRun>, ApiError> {
    let run = state
        .store
        .get_run(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("run"))?;
    Ok(Json(run))
}
