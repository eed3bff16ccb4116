//! Inventory seeding and inspection endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::*;
use crate::AppState;

use super::{created, ApiError};

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    Ok(())
}

// ========== Tenants ==========

pub async fn list_tenants(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    Ok(Json(state.store.list_tenants().await?))
}

pub async fn create_tenant(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTenantRequest>,
) -> Created<Tenant> {
    require_name(&req.name)?;
    let tenant = state.store.create_tenant(&req).await?;
    Ok(created(tenant))
}

// ========== Locations & racks ==========

pub async fn list_locations(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(state.store.list_locations().await?))
}

pub async fn create_location(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLocationRequest>,
) -> Created<Location> {
    require_name(&req.name)?;
    let location = state.store.create_location(&req).await?;
    Ok(created(location))
}

pub async fn create_rack(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRackRequest>,
) -> Created<Rack> {
    require_name(&req.name)?;
    let rack = state.store.create_rack(&req).await?;
    Ok(created(rack))
}

// ========== Devices ==========

pub async fn list_devices(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Device>>, ApiError> {
    Ok(Json(state.store.list_devices().await?))
}

/// Create a device; its type and role are registered on first use
pub async fn create_device(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Created<Device> {
    require_name(&req.name)?;
    if req.device_type.is_empty() || req.role.is_empty() {
        return Err(ApiError::bad_request("device_type and role are required"));
    }
    if req.position.is_some() && req.rack_id.is_none() {
        return Err(ApiError::bad_request("position requires a rack"));
    }
    let device = state.store.create_device(&req).await?;
    Ok(created(device))
}

pub async fn list_device_interfaces(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Interface>>, ApiError> {
    Ok(Json(state.store.list_device_interfaces(id).await?))
}

// ========== Interfaces & ports ==========

pub async fn create_interface(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInterfaceRequest>,
) -> Created<Interface> {
    require_name(&req.name)?;
    let iface = state.store.create_interface(&req).await?;
    Ok(created(iface))
}

pub async fn create_rear_port(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRearPortRequest>,
) -> Created<RearPort> {
    require_name(&req.name)?;
    if req.positions < 1 {
        return Err(ApiError::bad_request("positions must be at least 1"));
    }
    let port = state.store.create_rear_port(&req).await?;
    Ok(created(port))
}

pub async fn create_front_port(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFrontPortRequest>,
) -> Created<FrontPort> {
    require_name(&req.name)?;
    let port = state.store.create_front_port(&req).await?;
    Ok(created(port))
}

// ========== Cables ==========

pub async fn list_cables(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Cable>>, ApiError> {
    Ok(Json(state.store.list_cables().await?))
}

pub async fn create_cable(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCableRequest>,
) -> Created<Cable> {
    let cable = state.store.create_cable(&req).await?;
    Ok(created(cable))
}

// ========== IPAM ==========

pub async fn list_vlans(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Vlan>>, ApiError> {
    Ok(Json(state.store.list_vlans().await?))
}

pub async fn list_vrfs(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Vrf>>, ApiError> {
    Ok(Json(state.store.list_vrfs().await?))
}

pub async fn list_prefixes(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Prefix>>, ApiError> {
    Ok(Json(state.store.list_prefixes().await?))
}

pub async fn list_ip_addresses(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IpAddress>>, ApiError> {
    Ok(Json(state.store.list_ip_addresses().await?))
}

pub async fn list_fhrp_groups(
    _auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FhrpGroup>>, ApiError> {
    Ok(Json(state.store.list_fhrp_groups().await?))
}
