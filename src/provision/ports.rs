use std::collections::{BTreeSet, HashSet};

use crate::db::{InterfaceUpdate, InventoryTx};
use crate::error::ProvisionError;
use crate::models::*;
use crate::utils;

use super::log::RunLog;

/// Follow an access port's cabling to the switch interfaces it lands on.
///
/// The walk is jack rear port -> panel rear port -> panel front port ->
/// switch interfaces. A bonded pair patched into one front port yields
/// both interfaces.
pub async fn trace_access_port(tx: &mut InventoryTx, device: &Device) -> Result<Vec<Interface>, ProvisionError> {
    let rear = tx
        .rear_ports(device)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ProvisionError::topology(format!("access port {} has no rear port", device.name)))?;

    let panel_rear_id = match tx.cable_peers(Termination::rear_port(rear.id)).await?.first() {
        Some(peer) if peer.kind == TerminationKind::RearPort => peer.id,
        Some(_) => {
            return Err(ProvisionError::topology(format!(
                "{}:{} is not cabled to a panel rear port",
                device.name, rear.name
            )))
        }
        None => return Err(ProvisionError::topology(format!("{}:{} is not cabled", device.name, rear.name))),
    };
    let panel_rear = tx.rear_port(panel_rear_id).await?;

    let front = tx
        .front_ports_for_rear(&panel_rear)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ProvisionError::topology(format!(
                "{}:{} has no front port",
                panel_rear.device_name, panel_rear.name
            ))
        })?;

    let peers = tx.cable_peers(Termination::front_port(front.id)).await?;
    if peers.is_empty() {
        return Err(ProvisionError::topology(format!("{}:{} is not cabled", front.device_name, front.name)));
    }

    let mut interfaces = Vec::with_capacity(peers.len());
    for peer in peers {
        if peer.kind != TerminationKind::Interface {
            return Err(ProvisionError::topology(format!(
                "{}:{} does not end on a switch interface",
                front.device_name, front.name
            )));
        }
        interfaces.push(tx.interface(peer.id).await?);
    }
    Ok(interfaces)
}

/// Put the selected switch ports, direct or traced from access ports, into
/// the mode implied by the number of VLANs chosen.
pub async fn set_vlan_membership(
    tx: &mut InventoryTx,
    req: &SetVlanRequest,
    log: &mut RunLog,
) -> Result<String, ProvisionError> {
    req.validate()?;

    let mut vlans = Vec::with_capacity(req.vlans.len());
    for id in &req.vlans {
        vlans.push(tx.vlan(*id).await?);
    }
    let switch = match req.switch {
        Some(id) => Some(tx.device(id).await?),
        None => None,
    };

    let mut ports = Vec::new();
    for id in &req.switch_ports {
        let iface = tx.interface(*id).await?;
        if let Some(switch) = &switch {
            if iface.device_id != switch.id {
                return Err(ProvisionError::invalid(
                    "switch_ports",
                    format!("{} {} is not on switch {}", iface.device_name, iface.name, switch.name),
                ));
            }
        }
        ports.push(iface);
    }
    for id in &req.access_ports {
        let device = tx.device(*id).await?;
        ports.extend(trace_access_port(tx, &device).await?);
    }
    let mut seen = HashSet::new();
    ports.retain(|iface| seen.insert(iface.id));

    let vlan_ids: Vec<i64> = vlans.iter().map(|v| v.id).collect();
    let vids: Vec<u16> = vlans.iter().map(|v| v.vid).collect();
    let mut modified = BTreeSet::new();
    for port in &ports {
        let saved = tx
            .update_interface(
                port,
                InterfaceUpdate {
                    enabled: Some(req.enable),
                    membership: Some(VlanMembership::for_selection(&vlan_ids)),
                    ..InterfaceUpdate::default()
                },
            )
            .await?;
        let mode = saved.mode.map(|m| m.as_str()).unwrap_or("");
        log.info(format!("{} {} is {} for {}", saved.device_name, saved.name, mode, utils::join_vids(&vids)));
        modified.insert(saved.device_name);
    }

    let summary = format!("modified switches {}", modified.into_iter().collect::<Vec<_>>().join(","));
    log.success(summary.clone());
    Ok(summary)
}
