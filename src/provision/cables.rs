use std::collections::HashSet;

use crate::config::ProvisionPolicy;
use crate::db::InventoryTx;
use crate::error::ProvisionError;
use crate::models::*;

use super::conventions::{adjacent_positions, AccessPortName, Conventions};
use super::log::RunLog;

enum Wiring {
    Created,
    AlreadyConnected,
}

/// Plan a cable from every conventionally named access port in the
/// selected locations to its switch, skipping endpoints already cabled.
pub async fn connect_cables(
    tx: &mut InventoryTx,
    policy: &ProvisionPolicy,
    req: &ConnectCablesRequest,
    log: &mut RunLog,
) -> Result<String, ProvisionError> {
    req.validate()?;
    let conventions = Conventions::new(&policy.wiring)?;

    let port_type = tx.device_type_by_model(&policy.access_port_type).await?;
    let infra = tx.tenant_by_name(&policy.infra_tenant).await?;
    tx.device_role_by_name(&policy.switch_role).await?;
    for location_id in &req.locations {
        tx.location(*location_id).await?;
    }
    let stamp = match req.tenant {
        Some(id) => Some(tx.tenant(id).await?),
        None => None,
    };

    let excluded: HashSet<i64> = req.exclude_ports.iter().copied().collect();
    let mut ports = tx.devices_of_type_in(port_type.id, &req.locations).await?;
    ports.retain(|d| !excluded.contains(&d.id));
    ports.sort_by(|a, b| a.name.cmp(&b.name));

    let (mut created, mut skipped) = (0usize, 0usize);
    for port in &ports {
        let Some(name) = conventions.parse_access_port(&port.name) else {
            log.debug(format!("{} does not follow the access port naming", port.name));
            continue;
        };

        if let Some(tenant) = &stamp {
            tx.set_device_tenant(port, Some(tenant.id)).await?;
            log.info(format!("set tenant on {} to {}", port.name, tenant));
        }

        match wire_access_port(tx, policy, &conventions, &name, infra.id, log).await? {
            Wiring::Created => created += 1,
            Wiring::AlreadyConnected => skipped += 1,
        }
    }

    let summary = format!("created {} cables, {} already connected", created, skipped);
    log.success(summary.clone());
    Ok(summary)
}

async fn wire_access_port(
    tx: &mut InventoryTx,
    policy: &ProvisionPolicy,
    conventions: &Conventions<'_>,
    name: &AccessPortName,
    infra_tenant_id: i64,
    log: &mut RunLog,
) -> Result<Wiring, ProvisionError> {
    let panel_name = conventions.panel_name(&name.panel);
    let panel = tx.find_device_by_name(&panel_name).await?.ok_or_else(|| {
        ProvisionError::topology(format!("panel {} for port {}.{} does not exist", panel_name, name.panel, name.port))
    })?;
    let (rack_id, panel_position) = match (panel.rack_id, panel.position) {
        (Some(rack), Some(position)) => (rack, position),
        _ => return Err(ProvisionError::topology(format!("panel {} is not mounted in a rack", panel.name))),
    };

    let switches = tx
        .devices_in_rack(rack_id, &policy.switch_role, &adjacent_positions(panel_position))
        .await?;
    let switch = match switches.as_slice() {
        [switch] => switch,
        [] => {
            return Err(ProvisionError::topology(format!(
                "no {} directly above or below panel {}",
                policy.switch_role, panel.name
            )))
        }
        many => {
            let names: Vec<&str> = many.iter().map(|d| d.name.as_str()).collect();
            return Err(ProvisionError::topology(format!(
                "panel {} is adjacent to several switches: {}",
                panel.name,
                names.join(", ")
            )));
        }
    };
    let switch_position = switch
        .position
        .ok_or_else(|| ProvisionError::topology(format!("switch {} has no rack position", switch.name)))?;

    let index = conventions
        .interface_index(name.port, panel_position, switch_position)
        .ok_or_else(|| {
            ProvisionError::topology(format!(
                "port {} of panel {} maps to no switch interface",
                name.port, panel.name
            ))
        })?;

    let front_name = conventions.front_port_name(name.port);
    let front = tx
        .front_port_by_name(&panel, &front_name)
        .await?
        .ok_or_else(|| ProvisionError::topology(format!("panel {} has no front port {}", panel.name, front_name)))?;

    let matcher = conventions.interface_matcher(index)?;
    let candidates: Vec<Interface> = tx
        .leaf_interfaces(switch)
        .await?
        .into_iter()
        .filter(|iface| matcher.is_match(&iface.name))
        .collect();
    let iface = match candidates.as_slice() {
        [iface] => iface,
        [] => {
            return Err(ProvisionError::topology(format!(
                "switch {} has no interface numbered {}",
                switch.name, index
            )))
        }
        many => {
            let names: Vec<&str> = many.iter().map(|i| i.name.as_str()).collect();
            return Err(ProvisionError::topology(format!(
                "switch {} has several interfaces numbered {}: {}",
                switch.name,
                index,
                names.join(", ")
            )));
        }
    };

    if tx.cable_on(Termination::front_port(front.id)).await?.is_some() {
        log.info(format!("{}:{} already connected", panel.name, front.name));
        return Ok(Wiring::AlreadyConnected);
    }
    if tx.cable_on(Termination::interface(iface.id)).await?.is_some() {
        log.info(format!("{}:{} already connected", switch.name, iface.name));
        return Ok(Wiring::AlreadyConnected);
    }

    let cable = CreateCableRequest {
        status: cable_status::PLANNED.to_string(),
        cable_type: policy.cable.cable_type.clone(),
        color: policy.cable.color.clone(),
        length: Some(policy.cable.length.clone()),
        length_unit: policy.cable.length_unit.clone(),
        tenant_id: Some(infra_tenant_id),
        a_terminations: vec![Termination::front_port(front.id)],
        b_terminations: vec![Termination::interface(iface.id)],
    };
    tx.create_cable(&cable).await?;
    log.info(format!("connected {}:{} to {}:{}", panel.name, front.name, switch.name, iface.name));
    Ok(Wiring::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::testing::Fixture;

    fn request(fx: &Fixture) -> ConnectCablesRequest {
        ConnectCablesRequest {
            locations: vec![fx.location.id],
            exclude_ports: vec![],
            tenant: None,
            commit: true,
        }
    }

    async fn run(fx: &Fixture, req: &ConnectCablesRequest) -> (Result<String, ProvisionError>, RunLog) {
        let mut log = RunLog::new("test", operation::CONNECT_CABLES);
        let mut tx = fx.store.begin().await.unwrap();
        let result = connect_cables(&mut tx, &fx.policy, req, &mut log).await;
        if result.is_ok() {
            tx.commit().await.unwrap();
        } else {
            tx.rollback().await.unwrap();
        }
        (result, log)
    }

    #[tokio::test]
    async fn test_connects_panel_below_switch_to_even_interface() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        let panel = fx.panel("panel-012", &rack, 10, 24).await;
        let switch = fx.switch_in_rack("sw-a", &rack, 11, 48).await;
        fx.access_port("012.3").await;

        let (result, log) = run(&fx, &request(&fx)).await;
        assert_eq!(result.unwrap(), "created 1 cables, 0 already connected");
        assert_eq!(log.messages(LogLevel::Info), vec!["connected panel-012:3 to sw-a:swp6"]);

        let cables = fx.store.list_cables().await.unwrap();
        assert_eq!(cables.len(), 1);
        let cable = &cables[0];
        assert_eq!(cable.status, cable_status::PLANNED);
        assert_eq!(cable.cable_type, "cat6a");
        assert_eq!(cable.color, "9e9e9e");
        assert_eq!(cable.length.as_deref(), Some("15.00"));
        assert_eq!(cable.length_unit, "cm");
        assert_eq!(cable.tenant_id, Some(fx.infra.id));
        assert_eq!(cable.a_terminations, vec![Termination::front_port(fx.front_port(&panel, "3").await.id)]);
        assert_eq!(cable.b_terminations, vec![Termination::interface(fx.interface(&switch, "swp6").await.id)]);
    }

    #[tokio::test]
    async fn test_panel_above_switch_uses_odd_interface() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-7", &rack, 10, 24).await;
        fx.switch_in_rack("sw-b", &rack, 9, 48).await;
        fx.access_port("7.3").await;

        let (result, log) = run(&fx, &request(&fx)).await;
        assert!(result.is_ok());
        assert_eq!(log.messages(LogLevel::Info), vec!["connected panel-7:3 to sw-b:swp5"]);
    }

    #[tokio::test]
    async fn test_already_cabled_front_port_is_skipped() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        let panel = fx.panel("panel-1", &rack, 10, 4).await;
        let switch = fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.access_port("1.2").await;
        let other = fx.interface(&switch, "swp8").await;
        fx.cable(
            Termination::front_port(fx.front_port(&panel, "2").await.id),
            Termination::interface(other.id),
        )
        .await;

        let (result, log) = run(&fx, &request(&fx)).await;
        assert_eq!(result.unwrap(), "created 0 cables, 1 already connected");
        assert_eq!(log.messages(LogLevel::Info), vec!["panel-1:2 already connected"]);
        assert_eq!(fx.store.list_cables().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_already_cabled_switch_interface_is_skipped() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        let panel = fx.panel("panel-1", &rack, 10, 4).await;
        let switch = fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.access_port("1.2").await;
        // the panel's front port 2 is free but swp4 is taken by port 1
        let swp4 = fx.interface(&switch, "swp4").await;
        fx.cable(
            Termination::front_port(fx.front_port(&panel, "1").await.id),
            Termination::interface(swp4.id),
        )
        .await;

        let (result, log) = run(&fx, &request(&fx)).await;
        assert_eq!(result.unwrap(), "created 0 cables, 1 already connected");
        assert_eq!(log.messages(LogLevel::Info), vec!["sw-a:swp4 already connected"]);
        assert_eq!(fx.store.list_cables().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_creates_no_duplicate_cables() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.access_port("1.1").await;
        fx.access_port("1.2").await;

        let (first, _) = run(&fx, &request(&fx)).await;
        assert_eq!(first.unwrap(), "created 2 cables, 0 already connected");
        let (second, log) = run(&fx, &request(&fx)).await;
        assert_eq!(second.unwrap(), "created 0 cables, 2 already connected");
        assert_eq!(log.messages(LogLevel::Success), vec!["created 0 cables, 2 already connected"]);
        assert_eq!(fx.store.list_cables().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nonconforming_and_excluded_ports_are_ignored() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.access_port("lobby-jack").await;
        let excluded = fx.access_port("1.1").await;

        let mut req = request(&fx);
        req.exclude_ports = vec![excluded.id];
        let (result, log) = run(&fx, &req).await;
        assert_eq!(result.unwrap(), "created 0 cables, 0 already connected");
        assert_eq!(log.messages(LogLevel::Debug), vec!["lobby-jack does not follow the access port naming"]);
    }

    #[tokio::test]
    async fn test_ambiguous_switch_aborts_run() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        let panel = fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.switch_in_rack("sw-b", &rack, 9, 8).await;
        fx.access_port("1.1").await;

        let (result, _) = run(&fx, &request(&fx)).await;
        match result {
            Err(ProvisionError::Topology(msg)) => assert!(msg.contains(&panel.name), "{}", msg),
            other => panic!("expected topology error, got {:?}", other),
        }
        assert!(fx.store.list_cables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_switch_is_topology_error() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-far", &rack, 20, 8).await;
        fx.access_port("1.1").await;

        let (result, _) = run(&fx, &request(&fx)).await;
        assert!(matches!(result, Err(ProvisionError::Topology(_))));
    }

    #[tokio::test]
    async fn test_missing_panel_is_topology_error() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        fx.access_port("5.1").await;

        let (result, _) = run(&fx, &request(&fx)).await;
        match result {
            Err(ProvisionError::Topology(msg)) => assert_eq!(msg, "panel panel-5 for port 5.1 does not exist"),
            other => panic!("expected topology error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_port_without_interface_index_is_topology_error() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-a", &rack, 9, 8).await;
        fx.access_port("1.0").await;

        let (result, _) = run(&fx, &request(&fx)).await;
        match result {
            Err(ProvisionError::Topology(msg)) => {
                assert_eq!(msg, "port 0 of panel panel-1 maps to no switch interface")
            }
            other => panic!("expected topology error, got {:?}", other),
        }
        assert!(fx.store.list_cables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_interfaces_are_not_cabled() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        let switch = fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        // bond2 aggregates lan1 and would also match index 2
        let bond = fx.add_interface(&switch, "bond2", interface_type::LAG, None).await;
        fx.add_interface(&switch, "lan1", interface_type::BASE_T_1G, Some(bond.id)).await;
        fx.access_port("1.1").await;

        let (result, log) = run(&fx, &request(&fx)).await;
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(log.messages(LogLevel::Info), vec!["connected panel-1:1 to sw-a:swp2"]);
    }

    #[tokio::test]
    async fn test_tenant_is_stamped_on_access_ports() {
        let fx = Fixture::new().await;
        let rack = fx.rack("r1").await;
        fx.panel("panel-1", &rack, 10, 4).await;
        fx.switch_in_rack("sw-a", &rack, 11, 8).await;
        let port = fx.access_port("1.1").await;
        let lab = fx.tenant("Lab").await;

        let mut req = request(&fx);
        req.tenant = Some(lab.id);
        let (result, log) = run(&fx, &req).await;
        assert!(result.is_ok());
        assert_eq!(log.messages(LogLevel::Info)[0], "set tenant on 1.1 to Lab");
        let port = fx.store.get_device(port.id).await.unwrap().unwrap();
        assert_eq!(port.tenant_id, Some(lab.id));
    }
}
