use std::env;

use crate::provision::conventions::WiringPolicy;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub db_max_connections: u32,
    pub listen_addr: String,
    pub jwt_secret: String,
    pub policy: ProvisionPolicy,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            db_path: get_env("DB_PATH", "/data/rackwire.db"),
            db_max_connections: get_env("DB_MAX_CONNECTIONS", "5")
                .parse()
                .unwrap_or(5),
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
            jwt_secret: get_env("JWT_SECRET", ""),
            policy: ProvisionPolicy::load(),
        }
    }
}

/// Site conventions and fixed-name entities the provisioners resolve at
/// the start of every run.
#[derive(Debug, Clone)]
pub struct ProvisionPolicy {
    /// Tenant stamped on cables, virtual IPs and switch addresses
    pub infra_tenant: String,
    /// VLAN group every provisioned VLAN joins
    pub vlan_group: String,
    /// Device type model of access-port jacks
    pub access_port_type: String,
    pub switch_role: String,
    /// VRF shared by VLANs that are not behind the firewall
    pub shared_vrf: String,
    pub exit_prefix: String,
    pub bridge_interface: String,
    pub wiring: WiringPolicy,
    pub cable: CableDefaults,
}

impl ProvisionPolicy {
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            infra_tenant: get_env("INFRA_TENANT", &defaults.infra_tenant),
            vlan_group: get_env("VLAN_GROUP", &defaults.vlan_group),
            access_port_type: get_env("ACCESS_PORT_TYPE", &defaults.access_port_type),
            switch_role: get_env("SWITCH_ROLE", &defaults.switch_role),
            shared_vrf: get_env("SHARED_VRF", &defaults.shared_vrf),
            exit_prefix: get_env("EXIT_PREFIX", &defaults.exit_prefix),
            bridge_interface: get_env("BRIDGE_INTERFACE", &defaults.bridge_interface),
            wiring: WiringPolicy {
                access_port_pattern: get_env("ACCESS_PORT_PATTERN", &defaults.wiring.access_port_pattern),
                panel_name_template: get_env("PANEL_NAME_TEMPLATE", &defaults.wiring.panel_name_template),
                interface_name_template: get_env(
                    "INTERFACE_NAME_TEMPLATE",
                    &defaults.wiring.interface_name_template,
                ),
                lanes_per_port: parse_env("WIRING_LANES", defaults.wiring.lanes_per_port),
                below_offset: parse_env("WIRING_BELOW_OFFSET", defaults.wiring.below_offset),
                above_offset: parse_env("WIRING_ABOVE_OFFSET", defaults.wiring.above_offset),
            },
            cable: CableDefaults {
                cable_type: get_env("CABLE_TYPE", &defaults.cable.cable_type),
                color: get_env("CABLE_COLOR", &defaults.cable.color),
                length: get_env("CABLE_LENGTH", &defaults.cable.length),
                length_unit: get_env("CABLE_LENGTH_UNIT", &defaults.cable.length_unit),
            },
        }
    }
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            infra_tenant: "FRI IT".to_string(),
            vlan_group: "new-net".to_string(),
            access_port_type: "RJ45 access port".to_string(),
            switch_role: "switch".to_string(),
            shared_vrf: "outside".to_string(),
            exit_prefix: "exit-".to_string(),
            bridge_interface: "bridge".to_string(),
            wiring: WiringPolicy::default(),
            cable: CableDefaults::default(),
        }
    }
}

/// Attributes of every cable the inference engine plans
#[derive(Debug, Clone)]
pub struct CableDefaults {
    pub cable_type: String,
    pub color: String,
    pub length: String,
    pub length_unit: String,
}

impl Default for CableDefaults {
    fn default() -> Self {
        Self {
            cable_type: "cat6a".to_string(),
            color: "9e9e9e".to_string(),
            length: "15.00".to_string(),
            length_unit: "cm".to_string(),
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
