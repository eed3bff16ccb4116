use anyhow::{Context, Result};
use sqlx::{Row, sqlite::SqliteRow};

use crate::models::*;

/// Filter empty strings to None; the DB stores '' instead of NULL
pub fn none_if_empty(opt: Option<String>) -> Option<String> {
    opt.filter(|s| !s.is_empty())
}

/// Parse a comma separated id list produced by GROUP_CONCAT
pub fn csv_to_i64_vec(csv: Option<String>) -> Vec<i64> {
    match csv {
        Some(s) if !s.is_empty() => s.split(',').filter_map(|s| s.trim().parse::<i64>().ok()).collect(),
        _ => vec![],
    }
}

/// Build "?, ?, ?" for an IN clause with `n` bound values
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub fn map_location_row(row: &SqliteRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        description: none_if_empty(row.get("description")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn map_rack_row(row: &SqliteRow) -> Rack {
    Rack {
        id: row.get("id"),
        name: row.get("name"),
        location_id: row.get("location_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn map_device_type_row(row: &SqliteRow) -> DeviceType {
    DeviceType {
        id: row.get("id"),
        model: row.get("model"),
        slug: row.get("slug"),
    }
}

pub fn map_device_role_row(row: &SqliteRow) -> DeviceRole {
    DeviceRole {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
    }
}

/// Map a SQLite row to a Device struct
pub fn map_device_row(row: &SqliteRow) -> Device {
    Device {
        id: row.get("id"),
        name: row.get("name"),
        device_type_id: row.get("device_type_id"),
        device_type: row.try_get("device_type").unwrap_or_default(),
        role_id: row.get("role_id"),
        role: row.try_get("role").unwrap_or_default(),
        location_id: row.get("location_id"),
        rack_id: row.try_get::<Option<i64>, _>("rack_id").ok().flatten(),
        position: row.try_get::<Option<i32>, _>("position").ok().flatten(),
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to an Interface struct
pub fn map_interface_row(row: &SqliteRow) -> Interface {
    let enabled: i32 = row.get("enabled");
    let mode: String = row.get("mode");
    Interface {
        id: row.get("id"),
        device_id: row.get("device_id"),
        device_name: row.try_get("device_name").unwrap_or_default(),
        name: row.get("name"),
        iface_type: row.get("type"),
        enabled: enabled != 0,
        mode: InterfaceMode::parse(&mode),
        untagged_vlan_id: row.try_get::<Option<i64>, _>("untagged_vlan_id").ok().flatten(),
        tagged_vlan_ids: csv_to_i64_vec(row.try_get("tagged_vlan_ids_csv").ok().and_then(|v: Option<String>| v)),
        parent_id: row.try_get::<Option<i64>, _>("parent_id").ok().flatten(),
        lag_id: row.try_get::<Option<i64>, _>("lag_id").ok().flatten(),
        vrf_id: row.try_get::<Option<i64>, _>("vrf_id").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn map_rear_port_row(row: &SqliteRow) -> RearPort {
    RearPort {
        id: row.get("id"),
        device_id: row.get("device_id"),
        device_name: row.try_get("device_name").unwrap_or_default(),
        name: row.get("name"),
        positions: row.get("positions"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn map_front_port_row(row: &SqliteRow) -> FrontPort {
    FrontPort {
        id: row.get("id"),
        device_id: row.get("device_id"),
        device_name: row.try_get("device_name").unwrap_or_default(),
        name: row.get("name"),
        rear_port_id: row.get("rear_port_id"),
        rear_port_position: row.get("rear_port_position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a cable_terminations row to a Termination
pub fn map_termination_row(row: &SqliteRow) -> Result<(CableEnd, Termination)> {
    let end: String = row.get("cable_end");
    let kind: String = row.get("termination_type");
    let end = CableEnd::parse(&end).with_context(|| format!("unknown cable end '{}'", end))?;
    let kind = TerminationKind::parse(&kind).with_context(|| format!("unknown termination type '{}'", kind))?;
    Ok((end, Termination { kind, id: row.get("termination_id") }))
}

/// Map a cables row without its terminations
pub fn map_cable_row(row: &SqliteRow) -> Cable {
    Cable {
        id: row.get("id"),
        status: row.get("status"),
        cable_type: row.get("type"),
        color: row.get("color"),
        length: row.try_get::<Option<String>, _>("length").ok().flatten(),
        length_unit: row.get("length_unit"),
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        a_terminations: Vec::new(),
        b_terminations: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn map_tenant_row(row: &SqliteRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        name: row.get("name"),
        description: none_if_empty(row.get("description")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_to_i64_vec() {
        assert_eq!(csv_to_i64_vec(Some("3,1, 2".to_string())), vec![3, 1, 2]);
        assert!(csv_to_i64_vec(Some(String::new())).is_empty());
        assert!(csv_to_i64_vec(None).is_empty());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
    }
}
