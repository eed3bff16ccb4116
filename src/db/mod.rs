mod dcim;
mod inventory;
mod ipam;
pub(crate) mod row_helpers;
mod runs;
mod seeds;
mod tenants;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::config::ProvisionPolicy;
use crate::error::{NotFoundError, ProvisionError};
use crate::models::*;

pub use inventory::{InterfaceUpdate, InventoryTx, IpAddressUpdate, PrefixUpdate, VlanUpdate};

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database on a single connection that never expires
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Seed the fixed-name entities named by the provisioning policy
    pub async fn seed(&self, policy: &ProvisionPolicy) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        seeds::seed_policy_entities(&mut conn, policy).await
    }

    /// Open the write transaction for one provisioning run
    pub async fn begin(&self) -> Result<InventoryTx> {
        let tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Ok(InventoryTx::new(tx))
    }

    // ========== Tenant Operations ==========

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let mut conn = self.pool.acquire().await?;
        tenants::TenantRepo::list(&mut conn).await
    }

    pub async fn create_tenant(&self, req: &CreateTenantRequest) -> Result<Tenant> {
        let mut conn = self.pool.acquire().await?;
        tenants::TenantRepo::create(&mut conn, req).await
    }

    // ========== Location & Rack Operations ==========

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let mut conn = self.pool.acquire().await?;
        dcim::LocationRepo::list(&mut conn).await
    }

    pub async fn create_location(&self, req: &CreateLocationRequest) -> Result<Location> {
        let mut conn = self.pool.acquire().await?;
        dcim::LocationRepo::create(&mut conn, req).await
    }

    pub async fn create_rack(&self, req: &CreateRackRequest) -> Result<Rack> {
        let mut conn = self.pool.acquire().await?;
        if dcim::LocationRepo::get(&mut conn, req.location_id).await?.is_none() {
            return Err(NotFoundError::new("Location", &req.location_id.to_string()).into());
        }
        dcim::RackRepo::create(&mut conn, req).await
    }

    // ========== Device Operations ==========

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let mut conn = self.pool.acquire().await?;
        dcim::DeviceRepo::list(&mut conn).await
    }

    pub async fn get_device(&self, id: i64) -> Result<Option<Device>> {
        let mut conn = self.pool.acquire().await?;
        dcim::DeviceRepo::get(&mut conn, id).await
    }

    /// Create a device, registering its type and role on first use
    pub async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device> {
        let mut tx = self.pool.begin().await?;
        if let Some(rack_id) = req.rack_id {
            let rack = dcim::RackRepo::get(&mut tx, rack_id)
                .await?
                .ok_or_else(|| NotFoundError::new("Rack", &rack_id.to_string()))?;
            if rack.location_id != req.location_id {
                return Err(ProvisionError::invalid(
                    "device",
                    format!("rack {} is not in location {}", rack.name, req.location_id),
                )
                .into());
            }
        }
        let device_type = dcim::DeviceTypeRepo::ensure(&mut tx, &req.device_type).await?;
        let role = dcim::DeviceRoleRepo::ensure(&mut tx, &req.role).await?;
        let device = dcim::DeviceRepo::create(&mut tx, req, device_type.id, role.id).await?;
        tx.commit().await?;
        Ok(device)
    }

    pub async fn list_device_interfaces(&self, device_id: i64) -> Result<Vec<Interface>> {
        let mut conn = self.pool.acquire().await?;
        if dcim::DeviceRepo::get(&mut conn, device_id).await?.is_none() {
            return Err(NotFoundError::new("Device", &device_id.to_string()).into());
        }
        dcim::InterfaceRepo::list_for_device(&mut conn, device_id).await
    }

    // ========== Port Operations ==========

    pub async fn create_interface(&self, req: &CreateInterfaceRequest) -> Result<Interface> {
        let mut conn = self.pool.acquire().await?;
        dcim::InterfaceRepo::create(&mut conn, req).await
    }

    pub async fn create_rear_port(&self, req: &CreateRearPortRequest) -> Result<RearPort> {
        let mut conn = self.pool.acquire().await?;
        dcim::RearPortRepo::create(&mut conn, req).await
    }

    pub async fn create_front_port(&self, req: &CreateFrontPortRequest) -> Result<FrontPort> {
        let mut conn = self.pool.acquire().await?;
        let rear = dcim::RearPortRepo::get(&mut conn, req.rear_port_id)
            .await?
            .ok_or_else(|| NotFoundError::new("Rear port", &req.rear_port_id.to_string()))?;
        if rear.device_id != req.device_id {
            return Err(ProvisionError::invalid(
                "front port",
                format!("rear port {} belongs to another device", rear.name),
            )
            .into());
        }
        if req.rear_port_position < 1 || req.rear_port_position > rear.positions {
            return Err(ProvisionError::invalid(
                "front port",
                format!(
                    "position {} is outside 1-{} of rear port {}",
                    req.rear_port_position, rear.positions, rear.name
                ),
            )
            .into());
        }
        dcim::FrontPortRepo::create(&mut conn, req).await
    }

    // ========== Cable Operations ==========

    pub async fn list_cables(&self) -> Result<Vec<Cable>> {
        let mut conn = self.pool.acquire().await?;
        dcim::CableRepo::list(&mut conn).await
    }

    /// Create a cable with the same endpoint checks the provisioners get
    pub async fn create_cable(&self, req: &CreateCableRequest) -> Result<Cable, ProvisionError> {
        let mut tx = self.begin().await?;
        let cable = tx.create_cable(req).await?;
        tx.commit().await?;
        Ok(cable)
    }

    // ========== IPAM Operations ==========

    pub async fn list_vlans(&self) -> Result<Vec<Vlan>> {
        let mut conn = self.pool.acquire().await?;
        ipam::VlanRepo::list(&mut conn).await
    }

    pub async fn list_vrfs(&self) -> Result<Vec<Vrf>> {
        let mut conn = self.pool.acquire().await?;
        ipam::VrfRepo::list(&mut conn).await
    }

    pub async fn list_prefixes(&self) -> Result<Vec<Prefix>> {
        let mut conn = self.pool.acquire().await?;
        ipam::PrefixRepo::list(&mut conn).await
    }

    pub async fn list_ip_addresses(&self) -> Result<Vec<IpAddress>> {
        let mut conn = self.pool.acquire().await?;
        ipam::IpAddressRepo::list(&mut conn).await
    }

    pub async fn list_fhrp_groups(&self) -> Result<Vec<FhrpGroup>> {
        let mut conn = self.pool.acquire().await?;
        ipam::FhrpGroupRepo::list(&mut conn).await
    }

    pub async fn list_fhrp_assignments(&self, group_id: i64) -> Result<Vec<FhrpGroupAssignment>> {
        let mut conn = self.pool.acquire().await?;
        ipam::FhrpAssignmentRepo::list_for_group(&mut conn, group_id).await
    }

    // ========== Run History ==========

    pub async fn list_runs(&self, limit: i64) -> Result<Vec<ProvisionRun>> {
        let mut conn = self.pool.acquire().await?;
        runs::RunRepo::list(&mut conn, limit).await
    }

    pub async fn get_run(&self, id: &str) -> Result<Option<ProvisionRun>> {
        let mut conn = self.pool.acquire().await?;
        runs::RunRepo::get(&mut conn, id).await
    }

    pub async fn record_run(&self, run: &ProvisionRun) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        runs::RunRepo::record(&mut conn, run).await
    }
}
