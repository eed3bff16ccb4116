//! Inventory fixtures shared by the provisioner tests.

use crate::config::ProvisionPolicy;
use crate::db::Store;
use crate::models::*;

const PANEL_TYPE: &str = "24-port patch panel";
const PANEL_ROLE: &str = "patch panel";
const SWITCH_TYPE: &str = "generic switch";
const ACCESS_PORT_ROLE: &str = "access port";

pub struct Fixture {
    pub store: Store,
    pub policy: ProvisionPolicy,
    pub location: Location,
    pub infra: Tenant,
}

impl Fixture {
    /// Fresh in-memory inventory, seeded for the default policy, with one location
    pub async fn new() -> Self {
        let store = Store::in_memory().await.unwrap();
        let policy = ProvisionPolicy::default();
        store.seed(&policy).await.unwrap();

        let location = store
            .create_location(&CreateLocationRequest { name: "lab".to_string(), description: None })
            .await
            .unwrap();
        let infra = store
            .list_tenants()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == policy.infra_tenant)
            .unwrap();

        Self { store, policy, location, infra }
    }

    pub async fn tenant(&self, name: &str) -> Tenant {
        self.store
            .create_tenant(&CreateTenantRequest { name: name.to_string(), description: None })
            .await
            .unwrap()
    }

    pub async fn rack(&self, name: &str) -> Rack {
        self.store
            .create_rack(&CreateRackRequest { name: name.to_string(), location_id: self.location.id })
            .await
            .unwrap()
    }

    async fn device(&self, name: &str, device_type: &str, role: &str, rack: Option<&Rack>, position: Option<i32>) -> Device {
        self.store
            .create_device(&CreateDeviceRequest {
                name: name.to_string(),
                device_type: device_type.to_string(),
                role: role.to_string(),
                location_id: self.location.id,
                rack_id: rack.map(|r| r.id),
                position,
                tenant_id: None,
            })
            .await
            .unwrap()
    }

    /// Patch panel with rear and front ports `1..=ports`, front N mapped to rear N
    pub async fn panel(&self, name: &str, rack: &Rack, position: i32, ports: u32) -> Device {
        let panel = self.device(name, PANEL_TYPE, PANEL_ROLE, Some(rack), Some(position)).await;
        for n in 1..=ports {
            let rear = self
                .store
                .create_rear_port(&CreateRearPortRequest { device_id: panel.id, name: n.to_string(), positions: 1 })
                .await
                .unwrap();
            self.store
                .create_front_port(&CreateFrontPortRequest {
                    device_id: panel.id,
                    name: n.to_string(),
                    rear_port_id: rear.id,
                    rear_port_position: 1,
                })
                .await
                .unwrap();
        }
        panel
    }

    /// Switch with interfaces `swp1..=ports`
    pub async fn switch_in_rack(&self, name: &str, rack: &Rack, position: i32, ports: u32) -> Device {
        let switch = self
            .device(name, SWITCH_TYPE, &self.policy.switch_role, Some(rack), Some(position))
            .await;
        for n in 1..=ports {
            self.add_interface(&switch, &format!("swp{}", n), interface_type::BASE_T_1G, None).await;
        }
        switch
    }

    /// Unracked switch without interfaces
    pub async fn switch(&self, name: &str) -> Device {
        self.device(name, SWITCH_TYPE, &self.policy.switch_role, None, None).await
    }

    /// Unracked switch with a bridge interface
    pub async fn exit_switch(&self, name: &str) -> Device {
        let switch = self.switch(name).await;
        self.add_interface(&switch, &self.policy.bridge_interface, interface_type::BRIDGE, None).await;
        switch
    }

    /// Access-port jack with a single rear port named `1`
    pub async fn access_port(&self, name: &str) -> Device {
        let port = self
            .device(name, &self.policy.access_port_type, ACCESS_PORT_ROLE, None, None)
            .await;
        self.store
            .create_rear_port(&CreateRearPortRequest { device_id: port.id, name: "1".to_string(), positions: 1 })
            .await
            .unwrap();
        port
    }

    pub async fn add_interface(&self, device: &Device, name: &str, iface_type: &str, lag_id: Option<i64>) -> Interface {
        self.store
            .create_interface(&CreateInterfaceRequest {
                device_id: device.id,
                name: name.to_string(),
                iface_type: iface_type.to_string(),
                enabled: true,
                parent_id: None,
                lag_id,
            })
            .await
            .unwrap()
    }

    pub async fn interface(&self, device: &Device, name: &str) -> Interface {
        self.store
            .list_device_interfaces(device.id)
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.name == name)
            .unwrap()
    }

    pub async fn front_port(&self, device: &Device, name: &str) -> FrontPort {
        let mut tx = self.store.begin().await.unwrap();
        let port = tx.front_port_by_name(device, name).await.unwrap().unwrap();
        tx.rollback().await.unwrap();
        port
    }

    pub async fn rear_port(&self, device: &Device, name: &str) -> RearPort {
        let mut tx = self.store.begin().await.unwrap();
        let port = tx
            .rear_ports(device)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap();
        tx.rollback().await.unwrap();
        port
    }

    pub async fn cable(&self, a: Termination, b: Termination) -> Cable {
        self.cable_ends(vec![a], vec![b]).await
    }

    pub async fn cable_ends(&self, a: Vec<Termination>, b: Vec<Termination>) -> Cable {
        self.store
            .create_cable(&CreateCableRequest {
                status: cable_status::CONNECTED.to_string(),
                cable_type: String::new(),
                color: String::new(),
                length: None,
                length_unit: String::new(),
                tenant_id: None,
                a_terminations: a,
                b_terminations: b,
            })
            .await
            .unwrap()
    }

    pub async fn vlan(&self, vid: u16, name: &str) -> Vlan {
        let mut tx = self.store.begin().await.unwrap();
        let (vlan, _) = tx.get_or_create_vlan(vid, name).await.unwrap();
        tx.commit().await.unwrap();
        vlan
    }

    /// Everything a provisioning run may converge, without timestamps
    pub async fn snapshot(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for vrf in self.store.list_vrfs().await.unwrap() {
            lines.push(format!("vrf {} {} {:?}", vrf.id, vrf.name, vrf.tenant_id));
        }
        for vlan in self.store.list_vlans().await.unwrap() {
            lines.push(format!("vlan {} {} {} {:?} {:?}", vlan.id, vlan.vid, vlan.name, vlan.tenant_id, vlan.group_id));
        }
        for p in self.store.list_prefixes().await.unwrap() {
            lines.push(format!("prefix {} {} {:?} {:?} {:?} {:?}", p.id, p.prefix, p.tenant_id, p.vrf_id, p.vlan_id, p.role));
        }
        for ip in self.store.list_ip_addresses().await.unwrap() {
            lines.push(format!(
                "ip {} {} {:?} {:?} {:?} {:?} {:?}",
                ip.id, ip.address, ip.tenant_id, ip.vrf_id, ip.role, ip.interface_id, ip.fhrp_group_id
            ));
        }
        for group in self.store.list_fhrp_groups().await.unwrap() {
            lines.push(format!("fhrp {} {} {} {} {:?}", group.id, group.name, group.group_id, group.protocol, group.ip_addresses));
            for a in self.store.list_fhrp_assignments(group.id).await.unwrap() {
                lines.push(format!("fhrp-assignment {} {} {}", a.id, a.interface_id, a.priority));
            }
        }
        for device in self.store.list_devices().await.unwrap() {
            for i in self.store.list_device_interfaces(device.id).await.unwrap() {
                lines.push(format!(
                    "iface {} {} {} {} {:?} {:?} {:?} {:?}",
                    i.id, i.device_name, i.name, i.iface_type, i.mode, i.untagged_vlan_id, i.vrf_id, i.parent_id
                ));
            }
        }
        lines
    }
}
