//! Transactional view of the inventory used by the provisioners.
//!
//! Every provisioning run works through one `InventoryTx`. All reads see
//! the run's own uncommitted writes, and nothing reaches the database
//! unless the run commits. Dropping the value rolls the transaction back.

use ipnetwork::IpNetwork;
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error::ProvisionError;
use crate::models::*;

use super::dcim::*;
use super::ipam::*;
use super::tenants::TenantRepo;

type TxResult<T> = Result<T, ProvisionError>;

/// Fields the VLAN provisioner converges on an existing VLAN
#[derive(Debug, Clone)]
pub struct VlanUpdate {
    pub name: String,
    pub tenant_id: Option<i64>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct PrefixUpdate {
    pub tenant_id: Option<i64>,
    pub vrf_id: Option<i64>,
    pub vlan_id: Option<i64>,
    pub role: Option<String>,
}

/// Fields set on an address. Its interface binding is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct IpAddressUpdate {
    pub tenant_id: Option<i64>,
    pub vrf_id: Option<i64>,
    pub role: Option<String>,
    pub fhrp_group_id: Option<i64>,
}

/// Interface changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct InterfaceUpdate {
    pub iface_type: Option<String>,
    pub enabled: Option<bool>,
    pub vrf_id: Option<i64>,
    pub membership: Option<VlanMembership>,
}

pub struct InventoryTx {
    tx: Transaction<'static, Sqlite>,
}

impl InventoryTx {
    pub(super) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> TxResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> TxResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    // ========== Fixed-name entities ==========

    pub async fn tenant(&mut self, id: i64) -> TxResult<Tenant> {
        TenantRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Tenant", id))
    }

    pub async fn tenant_by_name(&mut self, name: &str) -> TxResult<Tenant> {
        TenantRepo::find_by_name(self.conn(), name)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Tenant", name))
    }

    pub async fn vlan_group_by_name(&mut self, name: &str) -> TxResult<VlanGroup> {
        VlanGroupRepo::find_by_name(self.conn(), name)
            .await?
            .ok_or_else(|| ProvisionError::not_found("VLAN group", name))
    }

    pub async fn device_type_by_model(&mut self, model: &str) -> TxResult<DeviceType> {
        DeviceTypeRepo::find_by_model(self.conn(), model)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Device type", model))
    }

    pub async fn device_role_by_name(&mut self, name: &str) -> TxResult<DeviceRole> {
        DeviceRoleRepo::find_by_name(self.conn(), name)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Device role", name))
    }

    // ========== Devices ==========

    pub async fn location(&mut self, id: i64) -> TxResult<Location> {
        LocationRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Location", id))
    }

    pub async fn device(&mut self, id: i64) -> TxResult<Device> {
        DeviceRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Device", id))
    }

    pub async fn find_device_by_name(&mut self, name: &str) -> TxResult<Option<Device>> {
        Ok(DeviceRepo::find_by_name(self.conn(), name).await?)
    }

    pub async fn devices_of_type_in(&mut self, device_type_id: i64, location_ids: &[i64]) -> TxResult<Vec<Device>> {
        Ok(DeviceRepo::list_by_type_in_locations(self.conn(), device_type_id, location_ids).await?)
    }

    pub async fn devices_in_rack(&mut self, rack_id: i64, role: &str, positions: &[i32]) -> TxResult<Vec<Device>> {
        Ok(DeviceRepo::list_in_rack_with_role(self.conn(), rack_id, role, positions).await?)
    }

    pub async fn devices_with_role(&mut self, role: &str) -> TxResult<Vec<Device>> {
        Ok(DeviceRepo::list_by_role(self.conn(), role).await?)
    }

    pub async fn set_device_tenant(&mut self, device: &Device, tenant_id: Option<i64>) -> TxResult<Device> {
        if let Some(id) = tenant_id {
            self.tenant(id).await?;
        }
        DeviceRepo::update_tenant(self.conn(), device.id, tenant_id).await?;
        self.device(device.id).await
    }

    // ========== Interfaces ==========

    pub async fn interface(&mut self, id: i64) -> TxResult<Interface> {
        InterfaceRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Interface", id))
    }

    pub async fn interface_by_name(&mut self, device: &Device, name: &str) -> TxResult<Option<Interface>> {
        Ok(InterfaceRepo::find_by_name(self.conn(), device.id, name).await?)
    }

    /// Interfaces of a device that aggregate no other interfaces
    pub async fn leaf_interfaces(&mut self, device: &Device) -> TxResult<Vec<Interface>> {
        Ok(InterfaceRepo::list_without_members(self.conn(), device.id).await?)
    }

    /// Get or create the child interface `name` under `parent` on the same device
    pub async fn get_or_create_child_interface(
        &mut self,
        parent: &Interface,
        name: &str,
        iface_type: &str,
    ) -> TxResult<(Interface, bool)> {
        if let Some(existing) = InterfaceRepo::find_by_name(self.conn(), parent.device_id, name).await? {
            return Ok((existing, false));
        }
        let req = CreateInterfaceRequest {
            device_id: parent.device_id,
            name: name.to_string(),
            iface_type: iface_type.to_string(),
            enabled: true,
            parent_id: Some(parent.id),
            lag_id: None,
        };
        let created = InterfaceRepo::create(self.conn(), &req).await?;
        Ok((created, true))
    }

    /// Apply an update, validate the result and persist it
    pub async fn update_interface(&mut self, iface: &Interface, update: InterfaceUpdate) -> TxResult<Interface> {
        let mut next = iface.clone();
        if let Some(t) = update.iface_type {
            next.iface_type = t;
        }
        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(vrf_id) = update.vrf_id {
            next.vrf_id = Some(vrf_id);
        }
        if let Some(membership) = update.membership {
            next.set_membership(membership);
        }
        self.validate_interface(&next).await?;
        Ok(InterfaceRepo::save(self.conn(), &next).await?)
    }

    async fn validate_interface(&mut self, iface: &Interface) -> TxResult<()> {
        let entity = format!("interface {}", iface.name);
        match iface.mode {
            Some(InterfaceMode::Access) if !iface.tagged_vlan_ids.is_empty() => {
                return Err(ProvisionError::invalid(entity, "access mode cannot carry tagged VLANs"));
            }
            Some(InterfaceMode::Tagged) if iface.untagged_vlan_id.is_some() => {
                return Err(ProvisionError::invalid(entity, "tagged mode cannot carry an untagged VLAN"));
            }
            None if iface.untagged_vlan_id.is_some() || !iface.tagged_vlan_ids.is_empty() => {
                return Err(ProvisionError::invalid(entity, "VLANs require an 802.1Q mode"));
            }
            _ => {}
        }
        for vlan_id in iface.untagged_vlan_id.iter().chain(iface.tagged_vlan_ids.iter()) {
            if VlanRepo::get(self.conn(), *vlan_id).await?.is_none() {
                return Err(ProvisionError::invalid(entity, format!("unknown VLAN {}", vlan_id)));
            }
        }
        if let Some(vrf_id) = iface.vrf_id {
            if VrfRepo::get(self.conn(), vrf_id).await?.is_none() {
                return Err(ProvisionError::invalid(entity, format!("unknown VRF {}", vrf_id)));
            }
        }
        if let Some(parent_id) = iface.parent_id {
            match InterfaceRepo::get(self.conn(), parent_id).await? {
                Some(parent) if parent.device_id == iface.device_id && parent.id != iface.id => {}
                _ => {
                    return Err(ProvisionError::invalid(
                        entity,
                        "parent must be another interface on the same device",
                    ))
                }
            }
        }
        Ok(())
    }

    // ========== Ports & cables ==========

    pub async fn rear_ports(&mut self, device: &Device) -> TxResult<Vec<RearPort>> {
        Ok(RearPortRepo::list_for_device(self.conn(), device.id).await?)
    }

    pub async fn rear_port(&mut self, id: i64) -> TxResult<RearPort> {
        RearPortRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("Rear port", id))
    }

    pub async fn front_port_by_name(&mut self, device: &Device, name: &str) -> TxResult<Option<FrontPort>> {
        Ok(FrontPortRepo::find_by_name(self.conn(), device.id, name).await?)
    }

    pub async fn front_ports_for_rear(&mut self, rear: &RearPort) -> TxResult<Vec<FrontPort>> {
        Ok(FrontPortRepo::list_for_rear_port(self.conn(), rear.id).await?)
    }

    /// Cable attached to an endpoint, if any
    pub async fn cable_on(&mut self, term: Termination) -> TxResult<Option<i64>> {
        Ok(CableRepo::find_for_termination(self.conn(), term).await?)
    }

    /// Endpoints at the far end of the cable attached to `term`
    pub async fn cable_peers(&mut self, term: Termination) -> TxResult<Vec<Termination>> {
        Ok(CableRepo::peers(self.conn(), term).await?)
    }

    /// Validate and persist a new cable
    pub async fn create_cable(&mut self, req: &CreateCableRequest) -> TxResult<Cable> {
        validate_cable_fields(req)?;
        for term in req.a_terminations.iter().chain(req.b_terminations.iter()) {
            if !self.termination_exists(*term).await? {
                return Err(ProvisionError::invalid(
                    "cable",
                    format!("{} {} does not exist", term.kind.as_str(), term.id),
                ));
            }
            if let Some(cable_id) = self.cable_on(*term).await? {
                return Err(ProvisionError::invalid(
                    "cable",
                    format!("{} {} already has cable {}", term.kind.as_str(), term.id, cable_id),
                ));
            }
        }
        Ok(CableRepo::create(self.conn(), req).await?)
    }

    async fn termination_exists(&mut self, term: Termination) -> TxResult<bool> {
        let found = match term.kind {
            TerminationKind::Interface => InterfaceRepo::get(self.conn(), term.id).await?.is_some(),
            TerminationKind::FrontPort => FrontPortRepo::get(self.conn(), term.id).await?.is_some(),
            TerminationKind::RearPort => RearPortRepo::get(self.conn(), term.id).await?.is_some(),
        };
        Ok(found)
    }

    // ========== VRFs & VLANs ==========

    pub async fn get_or_create_vrf(&mut self, name: &str) -> TxResult<(Vrf, bool)> {
        if let Some(vrf) = VrfRepo::find_by_name(self.conn(), name).await? {
            return Ok((vrf, false));
        }
        Ok((VrfRepo::create(self.conn(), name).await?, true))
    }

    pub async fn set_vrf_tenant(&mut self, vrf: &Vrf, tenant_id: Option<i64>) -> TxResult<Vrf> {
        if let Some(id) = tenant_id {
            self.tenant(id).await?;
        }
        let next = Vrf { tenant_id, ..vrf.clone() };
        Ok(VrfRepo::save(self.conn(), &next).await?)
    }

    pub async fn vlan(&mut self, id: i64) -> TxResult<Vlan> {
        VlanRepo::get(self.conn(), id)
            .await?
            .ok_or_else(|| ProvisionError::not_found("VLAN", id))
    }

    /// VLANs are keyed by vid; a new VLAN starts out with `name`
    pub async fn get_or_create_vlan(&mut self, vid: u16, name: &str) -> TxResult<(Vlan, bool)> {
        if let Some(vlan) = VlanRepo::find_by_vid(self.conn(), vid).await? {
            return Ok((vlan, false));
        }
        validate_vlan_fields(vid, name)?;
        Ok((VlanRepo::create(self.conn(), vid, name).await?, true))
    }

    pub async fn update_vlan(&mut self, vlan: &Vlan, update: VlanUpdate) -> TxResult<Vlan> {
        validate_vlan_fields(vlan.vid, &update.name)?;
        let next = Vlan {
            name: update.name,
            tenant_id: update.tenant_id,
            group_id: update.group_id,
            ..vlan.clone()
        };
        Ok(VlanRepo::save(self.conn(), &next).await?)
    }

    // ========== FHRP ==========

    pub async fn get_or_create_fhrp_group(
        &mut self,
        name: &str,
        group_id: i32,
        protocol: &str,
    ) -> TxResult<(FhrpGroup, bool)> {
        if !fhrp_protocol::ALL.contains(&protocol) {
            return Err(ProvisionError::invalid("FHRP group", format!("unknown protocol '{}'", protocol)));
        }
        if let Some(group) = FhrpGroupRepo::find(self.conn(), name, group_id, protocol).await? {
            return Ok((group, false));
        }
        Ok((FhrpGroupRepo::create(self.conn(), name, group_id, protocol).await?, true))
    }

    pub async fn get_or_create_fhrp_assignment(
        &mut self,
        group: &FhrpGroup,
        iface: &Interface,
        priority: i32,
    ) -> TxResult<(FhrpGroupAssignment, bool)> {
        if !(0..=255).contains(&priority) {
            return Err(ProvisionError::invalid("FHRP assignment", format!("priority {} is outside 0-255", priority)));
        }
        if let Some(mut existing) = FhrpAssignmentRepo::find(self.conn(), group.id, iface.id).await? {
            if existing.priority != priority {
                existing.priority = priority;
                FhrpAssignmentRepo::save(self.conn(), &existing).await?;
            }
            return Ok((existing, false));
        }
        let created = FhrpAssignmentRepo::create(self.conn(), group.id, iface.id, priority).await?;
        Ok((created, true))
    }

    // ========== Prefixes & addresses ==========

    /// Prefixes are keyed by their canonical network
    pub async fn get_or_create_prefix(&mut self, network: IpNetwork) -> TxResult<(Prefix, bool)> {
        if let Some(prefix) = PrefixRepo::find_by_network(self.conn(), network).await? {
            return Ok((prefix, false));
        }
        Ok((PrefixRepo::create(self.conn(), network).await?, true))
    }

    pub async fn update_prefix(&mut self, prefix: &Prefix, update: PrefixUpdate) -> TxResult<Prefix> {
        if let Some(id) = update.tenant_id {
            self.tenant(id).await?;
        }
        let next = Prefix {
            tenant_id: update.tenant_id,
            vrf_id: update.vrf_id,
            vlan_id: update.vlan_id,
            role: update.role,
            ..prefix.clone()
        };
        Ok(PrefixRepo::save(self.conn(), &next).await?)
    }

    /// Get or create `address` among the records not bound to an interface
    pub async fn get_or_create_unassigned_address(&mut self, address: IpNetwork) -> TxResult<(IpAddress, bool)> {
        if let Some(ip) = IpAddressRepo::find_unassigned(self.conn(), address).await? {
            return Ok((ip, false));
        }
        Ok((IpAddressRepo::create(self.conn(), address, None).await?, true))
    }

    pub async fn get_or_create_interface_address(
        &mut self,
        iface: &Interface,
        address: IpNetwork,
    ) -> TxResult<(IpAddress, bool)> {
        if let Some(ip) = IpAddressRepo::find_on_interface(self.conn(), iface.id, address).await? {
            return Ok((ip, false));
        }
        Ok((IpAddressRepo::create(self.conn(), address, Some(iface.id)).await?, true))
    }

    pub async fn update_ip_address(&mut self, ip: &IpAddress, update: IpAddressUpdate) -> TxResult<IpAddress> {
        let next = IpAddress {
            tenant_id: update.tenant_id,
            vrf_id: update.vrf_id,
            role: update.role,
            fhrp_group_id: update.fhrp_group_id,
            ..ip.clone()
        };
        if next.interface_id.is_some() && next.fhrp_group_id.is_some() {
            return Err(ProvisionError::invalid(
                format!("ip address {}", next.address),
                "cannot be assigned to both an interface and an FHRP group",
            ));
        }
        Ok(IpAddressRepo::save(self.conn(), &next).await?)
    }
}

fn validate_vlan_fields(vid: u16, name: &str) -> TxResult<()> {
    if !(1..=4094).contains(&vid) {
        return Err(ProvisionError::invalid("vlan", format!("vid {} is outside 1-4094", vid)));
    }
    if name.is_empty() || name.len() > 64 {
        return Err(ProvisionError::invalid("vlan", format!("name '{}' must be 1-64 characters", name)));
    }
    Ok(())
}

fn validate_cable_fields(req: &CreateCableRequest) -> TxResult<()> {
    if req.a_terminations.is_empty() || req.b_terminations.is_empty() {
        return Err(ProvisionError::invalid("cable", "both ends need at least one termination"));
    }
    if !cable_status::ALL.contains(&req.status.as_str()) {
        return Err(ProvisionError::invalid("cable", format!("unknown status '{}'", req.status)));
    }
    if !req.color.is_empty() && !(req.color.len() == 6 && req.color.chars().all(|c| c.is_ascii_hexdigit())) {
        return Err(ProvisionError::invalid("cable", format!("color '{}' is not a 6-digit hex value", req.color)));
    }
    if let Some(length) = &req.length {
        match length.parse::<f64>() {
            Ok(l) if l > 0.0 => {}
            _ => return Err(ProvisionError::invalid("cable", format!("length '{}' is not a positive number", length))),
        }
        if req.length_unit.is_empty() {
            return Err(ProvisionError::invalid("cable", "length requires a unit"));
        }
    }
    Ok(())
}
