use crate::config::ProvisionPolicy;
use crate::db::{InterfaceUpdate, InventoryTx, IpAddressUpdate, PrefixUpdate, VlanUpdate};
use crate::error::ProvisionError;
use crate::models::*;
use crate::utils;

use super::log::RunLog;

fn verb(created: bool) -> &'static str {
    if created { "created" } else { "got" }
}

/// Exit switches in the order that fixes their address offsets: byte-wise
/// by name, so adding a switch never renumbers the ones sorting before it.
pub fn exit_switches(mut switches: Vec<Device>, prefix: &str) -> Vec<Device> {
    switches.retain(|d| d.name.starts_with(prefix));
    switches.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    switches
}

/// Converge the VRF, VLAN, prefixes, virtual addresses and FHRP group of
/// one VLAN, then replicate its bridge interface on every exit switch.
pub async fn create_vlan(
    tx: &mut InventoryTx,
    policy: &ProvisionPolicy,
    req: &CreateVlanRequest,
    log: &mut RunLog,
) -> Result<String, ProvisionError> {
    req.validate()?;
    let vid = u16::try_from(req.vlan_id)
        .map_err(|_| ProvisionError::invalid("vlan_id", format!("{} is not a VLAN id", req.vlan_id)))?;

    let tenant = tx.tenant(req.tenant).await?;
    let infra = tx.tenant_by_name(&policy.infra_tenant).await?;
    let group = tx.vlan_group_by_name(&policy.vlan_group).await?;

    let (vrf_name, vrf_tenant) = if req.firewall {
        (req.vlan_name.as_str(), Some(tenant.id))
    } else {
        (policy.shared_vrf.as_str(), None)
    };
    let (vrf, created) = tx.get_or_create_vrf(vrf_name).await?;
    log.info(format!("{} VRF {}", verb(created), vrf.name));
    let vrf = tx.set_vrf_tenant(&vrf, vrf_tenant).await?;

    let (vlan, created) = tx.get_or_create_vlan(vid, &req.vlan_name).await?;
    let vlan = tx
        .update_vlan(
            &vlan,
            VlanUpdate {
                name: req.vlan_name.clone(),
                tenant_id: Some(tenant.id),
                group_id: Some(group.id),
            },
        )
        .await?;
    log.info(format!("{} VLAN {}", verb(created), vlan));

    let (fhrp, created) = tx
        .get_or_create_fhrp_group(&req.vlan_name, i32::from(vid), fhrp_protocol::OTHER)
        .await?;
    log.info(format!("{} FHRP group {} ({})", verb(created), fhrp.name, fhrp.group_id));

    let mut prefixes = Vec::new();
    for network in req.networks() {
        let (prefix, created) = tx.get_or_create_prefix(network).await?;
        log.info(format!("{} prefix {}", verb(created), prefix.prefix));
        let prefix = tx
            .update_prefix(
                &prefix,
                PrefixUpdate {
                    tenant_id: Some(tenant.id),
                    vrf_id: Some(vrf.id),
                    vlan_id: Some(vlan.id),
                    role: None,
                },
            )
            .await?;

        let (vip, created) = tx
            .get_or_create_unassigned_address(utils::host_at(prefix.prefix, 1)?)
            .await?;
        log.info(format!("{} vip {}", verb(created), vip.address));
        tx.update_ip_address(
            &vip,
            IpAddressUpdate {
                tenant_id: Some(infra.id),
                vrf_id: Some(vrf.id),
                role: vip.role.clone(),
                fhrp_group_id: Some(fhrp.id),
            },
        )
        .await?;
        prefixes.push(prefix);
    }

    let exits = exit_switches(tx.devices_with_role(&policy.switch_role).await?, &policy.exit_prefix);
    for (index, switch) in exits.iter().enumerate() {
        let bridge = tx
            .interface_by_name(switch, &policy.bridge_interface)
            .await?
            .ok_or_else(|| {
                ProvisionError::not_found("Interface", format!("{}:{}", switch.name, policy.bridge_interface))
            })?;
        let child_name = format!("{}.{}", bridge.name, vid);
        let (child, created) = tx
            .get_or_create_child_interface(&bridge, &child_name, interface_type::VIRTUAL)
            .await?;

        let (_, assigned) = tx.get_or_create_fhrp_assignment(&fhrp, &child, 0).await?;
        log.info(format!("{} FHRP assignment {} on {}", verb(assigned), fhrp.name, child.name));

        let child = tx
            .update_interface(
                &child,
                InterfaceUpdate {
                    iface_type: Some(interface_type::VIRTUAL.to_string()),
                    enabled: None,
                    vrf_id: Some(vrf.id),
                    membership: Some(VlanMembership::Access(Some(vlan.id))),
                },
            )
            .await?;
        log.info(format!("{} interface {} on {}", verb(created), child.name, switch.name));

        for prefix in &prefixes {
            let address = utils::host_at(prefix.prefix, 2 + index as u128)?;
            let (ip, created) = tx.get_or_create_interface_address(&child, address).await?;
            log.info(format!("{} address {}", verb(created), ip.address));
            tx.update_ip_address(
                &ip,
                IpAddressUpdate {
                    tenant_id: Some(infra.id),
                    vrf_id: Some(vrf.id),
                    role: None,
                    fhrp_group_id: None,
                },
            )
            .await?;
        }
    }

    let summary = format!("VLAN {} ready on {} exit switches", vlan, exits.len());
    log.success(summary.clone());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::testing::Fixture;
    use chrono::Utc;

    fn device(name: &str) -> Device {
        Device {
            id: 0,
            name: name.to_string(),
            device_type_id: 1,
            device_type: String::new(),
            role_id: 1,
            role: "switch".to_string(),
            location_id: 1,
            rack_id: None,
            position: None,
            tenant_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(fx: &Fixture, net4: Option<&str>, net6: Option<&str>) -> CreateVlanRequest {
        CreateVlanRequest {
            vlan_name: "lab".to_string(),
            vlan_id: 100,
            tenant: fx.infra.id,
            net4: net4.map(|n| n.parse().unwrap()),
            net6: net6.map(|n| n.parse().unwrap()),
            firewall: true,
            commit: true,
        }
    }

    async fn run(fx: &Fixture, req: &CreateVlanRequest) -> (Result<String, ProvisionError>, RunLog) {
        let mut log = RunLog::new("test", operation::CREATE_VLAN);
        let mut tx = fx.store.begin().await.unwrap();
        let result = create_vlan(&mut tx, &fx.policy, req, &mut log).await;
        if result.is_ok() {
            tx.commit().await.unwrap();
        } else {
            tx.rollback().await.unwrap();
        }
        (result, log)
    }

    async fn addresses_on(fx: &Fixture, switch: &Device, iface: &str) -> Vec<String> {
        let iface = fx.interface(switch, iface).await;
        fx.store
            .list_ip_addresses()
            .await
            .unwrap()
            .into_iter()
            .filter(|ip| ip.interface_id == Some(iface.id))
            .map(|ip| ip.address.to_string())
            .collect()
    }

    #[test]
    fn test_exit_switches_sorted_by_name() {
        let switches = vec![device("exit-c"), device("core-1"), device("exit-a"), device("exit-B"), device("exit-b")];
        let names: Vec<String> = exit_switches(switches, "exit-").into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["exit-B", "exit-a", "exit-b", "exit-c"]);
    }

    #[tokio::test]
    async fn test_addresses_follow_exit_switch_order() {
        let fx = Fixture::new().await;
        // created out of order on purpose
        let c = fx.exit_switch("exit-c").await;
        let a = fx.exit_switch("exit-a").await;
        let b = fx.exit_switch("exit-b").await;
        fx.switch("core-1").await;

        let (result, log) = run(&fx, &request(&fx, Some("10.0.0.0/24"), None)).await;
        assert_eq!(result.unwrap(), "VLAN lab (100) ready on 3 exit switches");
        assert_eq!(log.messages(LogLevel::Success), vec!["VLAN lab (100) ready on 3 exit switches"]);

        assert_eq!(addresses_on(&fx, &a, "bridge.100").await, vec!["10.0.0.2/24"]);
        assert_eq!(addresses_on(&fx, &b, "bridge.100").await, vec!["10.0.0.3/24"]);
        assert_eq!(addresses_on(&fx, &c, "bridge.100").await, vec!["10.0.0.4/24"]);

        let groups = fx.store.list_fhrp_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "lab");
        assert_eq!(groups[0].group_id, 100);
        assert_eq!(groups[0].protocol, fhrp_protocol::OTHER);
        assert_eq!(groups[0].ip_addresses, vec!["10.0.0.1/24"]);

        let assignments = fx.store.list_fhrp_assignments(groups[0].id).await.unwrap();
        assert_eq!(assignments.len(), 3);
        assert!(assignments.iter().all(|a| a.priority == 0));
    }

    #[tokio::test]
    async fn test_bridge_child_is_configured() {
        let fx = Fixture::new().await;
        let exit = fx.exit_switch("exit-a").await;

        let (result, _) = run(&fx, &request(&fx, Some("10.0.0.0/24"), None)).await;
        assert!(result.is_ok(), "{:?}", result);

        let bridge = fx.interface(&exit, "bridge").await;
        let child = fx.interface(&exit, "bridge.100").await;
        let vlan = &fx.store.list_vlans().await.unwrap()[0];
        let vrf = fx.store.list_vrfs().await.unwrap().into_iter().find(|v| v.name == "lab").unwrap();

        assert_eq!(child.parent_id, Some(bridge.id));
        assert_eq!(child.iface_type, interface_type::VIRTUAL);
        assert_eq!(child.mode, Some(InterfaceMode::Access));
        assert_eq!(child.untagged_vlan_id, Some(vlan.id));
        assert_eq!(child.vrf_id, Some(vrf.id));
        assert!(child.tagged_vlan_ids.is_empty());

        let ip = fx.store.list_ip_addresses().await.unwrap().into_iter()
            .find(|ip| ip.interface_id == Some(child.id)).unwrap();
        assert_eq!(ip.tenant_id, Some(fx.infra.id));
        assert_eq!(ip.vrf_id, Some(vrf.id));
        assert_eq!(ip.role, None);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let fx = Fixture::new().await;
        fx.exit_switch("exit-a").await;
        fx.exit_switch("exit-b").await;
        let req = request(&fx, Some("10.0.0.0/24"), Some("2001:db8::/64"));

        let (first, first_log) = run(&fx, &req).await;
        assert!(first.is_ok(), "{:?}", first);
        let snapshot = fx.snapshot().await;

        let (second, second_log) = run(&fx, &req).await;
        assert!(second.is_ok(), "{:?}", second);
        assert_eq!(fx.snapshot().await, snapshot);

        assert!(first_log.messages(LogLevel::Info).contains(&"created VLAN lab (100)"));
        assert!(second_log.messages(LogLevel::Info).contains(&"got VLAN lab (100)"));
        assert!(second_log.messages(LogLevel::Info).iter().all(|m| !m.starts_with("created")));
    }

    #[tokio::test]
    async fn test_ipv6_and_canonical_prefix() {
        let fx = Fixture::new().await;
        let exit = fx.exit_switch("exit-a").await;

        let (result, _) = run(&fx, &request(&fx, Some("10.0.0.7/24"), Some("2001:db8::/64"))).await;
        assert!(result.is_ok(), "{:?}", result);

        let prefixes: Vec<String> = fx.store.list_prefixes().await.unwrap().iter().map(|p| p.prefix.to_string()).collect();
        assert_eq!(prefixes, vec!["10.0.0.0/24", "2001:db8::/64"]);
        assert_eq!(addresses_on(&fx, &exit, "bridge.100").await, vec!["10.0.0.2/24", "2001:db8::2/64"]);

        let vips = &fx.store.list_fhrp_groups().await.unwrap()[0].ip_addresses;
        assert_eq!(vips.len(), 2);
        assert!(vips.contains(&"2001:db8::1/64".to_string()));
    }

    #[tokio::test]
    async fn test_without_firewall_uses_shared_vrf() {
        let fx = Fixture::new().await;
        fx.exit_switch("exit-a").await;
        let mut req = request(&fx, Some("10.0.0.0/24"), None);
        req.firewall = false;

        let (result, log) = run(&fx, &req).await;
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(log.messages(LogLevel::Info)[0], "created VRF outside");

        let vrfs = fx.store.list_vrfs().await.unwrap();
        assert_eq!(vrfs.len(), 1);
        assert_eq!(vrfs[0].name, "outside");
        assert_eq!(vrfs[0].tenant_id, None);
    }

    #[tokio::test]
    async fn test_dropping_firewall_moves_vlan_to_shared_vrf() {
        let fx = Fixture::new().await;
        let exit = fx.exit_switch("exit-a").await;
        let mut req = request(&fx, Some("10.0.0.0/24"), None);
        run(&fx, &req).await.0.unwrap();

        req.firewall = false;
        let (result, _) = run(&fx, &req).await;
        assert!(result.is_ok(), "{:?}", result);

        let outside = fx
            .store
            .list_vrfs()
            .await
            .unwrap()
            .into_iter()
            .find(|v| v.name == "outside")
            .unwrap();
        let prefixes = fx.store.list_prefixes().await.unwrap();
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].vrf_id, Some(outside.id));
        assert_eq!(fx.interface(&exit, "bridge.100").await.vrf_id, Some(outside.id));

        let addresses = fx.store.list_ip_addresses().await.unwrap();
        assert_eq!(addresses.len(), 2);
        for ip in addresses {
            assert_eq!(ip.vrf_id, Some(outside.id), "{}", ip.address);
        }
    }

    #[tokio::test]
    async fn test_missing_bridge_rolls_back() {
        let fx = Fixture::new().await;
        fx.exit_switch("exit-a").await;
        fx.switch("exit-b").await;

        let (result, _) = run(&fx, &request(&fx, Some("10.0.0.0/24"), None)).await;
        match result {
            Err(ProvisionError::NotFound(e)) => assert_eq!(e.id, "exit-b:bridge"),
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(fx.store.list_vlans().await.unwrap().is_empty());
        assert!(fx.store.list_ip_addresses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_network_fails() {
        let fx = Fixture::new().await;
        fx.exit_switch("exit-a").await;

        let (result, _) = run(&fx, &request(&fx, Some("10.0.0.0/31"), None)).await;
        assert!(matches!(result, Err(ProvisionError::Validation { .. })), "{:?}", result);
        assert!(fx.store.list_prefixes().await.unwrap().is_empty());
    }
}
