use anyhow::{Context, Result};
use ipnetwork::IpNetwork;
use sqlx::{Row, sqlite::SqliteRow};

use crate::models::*;
use crate::db::row_helpers::none_if_empty;

fn parse_network(row: &SqliteRow, column: &str) -> Result<IpNetwork> {
    let raw: String = row.get(column);
    raw.parse::<IpNetwork>()
        .with_context(|| format!("stored {} '{}' is not a valid network", column, raw))
}

pub(super) fn csv_to_vec(csv: Option<String>) -> Vec<String> {
    match csv {
        Some(s) if !s.is_empty() => s.split(',').map(|s| s.to_string()).collect(),
        _ => vec![],
    }
}

pub(super) fn map_vlan_group_row(row: &SqliteRow) -> VlanGroup {
    VlanGroup {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn map_vlan_row(row: &SqliteRow) -> Vlan {
    let vid: i64 = row.get("vid");
    Vlan {
        id: row.get("id"),
        vid: vid as u16,
        name: row.get("name"),
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        group_id: row.try_get::<Option<i64>, _>("group_id").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn map_vrf_row(row: &SqliteRow) -> Vrf {
    Vrf {
        id: row.get("id"),
        name: row.get("name"),
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn map_prefix_row(row: &SqliteRow) -> Result<Prefix> {
    Ok(Prefix {
        id: row.get("id"),
        prefix: parse_network(row, "prefix")?,
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        vrf_id: row.try_get::<Option<i64>, _>("vrf_id").ok().flatten(),
        vlan_id: row.try_get::<Option<i64>, _>("vlan_id").ok().flatten(),
        role: none_if_empty(row.get("role")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(super) fn map_ip_address_row(row: &SqliteRow) -> Result<IpAddress> {
    Ok(IpAddress {
        id: row.get("id"),
        address: parse_network(row, "address")?,
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        vrf_id: row.try_get::<Option<i64>, _>("vrf_id").ok().flatten(),
        role: none_if_empty(row.get("role")),
        interface_id: row.try_get::<Option<i64>, _>("interface_id").ok().flatten(),
        fhrp_group_id: row.try_get::<Option<i64>, _>("fhrp_group_id").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(super) fn map_fhrp_group_row(row: &SqliteRow) -> FhrpGroup {
    FhrpGroup {
        id: row.get("id"),
        name: row.get("name"),
        group_id: row.get("group_id"),
        protocol: row.get("protocol"),
        ip_addresses: csv_to_vec(row.try_get("ip_addresses_csv").ok().and_then(|v: Option<String>| v)),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn map_fhrp_assignment_row(row: &SqliteRow) -> FhrpGroupAssignment {
    FhrpGroupAssignment {
        id: row.get("id"),
        group_id: row.get("group_id"),
        interface_id: row.get("interface_id"),
        priority: row.get("priority"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_to_vec() {
        assert_eq!(csv_to_vec(Some("10.0.0.1/24,2001:db8::1/64".to_string())), vec!["10.0.0.1/24", "2001:db8::1/64"]);
        assert!(csv_to_vec(None).is_empty());
    }
}
