use anyhow::Result;
use sqlx::SqliteConnection;

use crate::config::ProvisionPolicy;
use super::dcim::{DeviceRoleRepo, DeviceTypeRepo};
use super::ipam::VlanGroupRepo;
use super::tenants::TenantRepo;

/// Insert the fixed-name entities a policy refers to, leaving existing
/// rows untouched. The shared VRF is created on demand by the VLAN
/// provisioner instead.
pub(super) async fn seed_policy_entities(conn: &mut SqliteConnection, policy: &ProvisionPolicy) -> Result<()> {
    TenantRepo::ensure(conn, &policy.infra_tenant).await?;
    VlanGroupRepo::ensure(conn, &policy.vlan_group).await?;
    DeviceTypeRepo::ensure(conn, &policy.access_port_type).await?;
    DeviceRoleRepo::ensure(conn, &policy.switch_role).await?;
    Ok(())
}
