mod auth;
mod dcim;
mod ipam;
mod provision;
mod tenant;

pub use auth::*;
pub use dcim::*;
pub use ipam::*;
pub use provision::*;
pub use tenant::*;

/// Canonical cable status values
pub mod cable_status {
    pub const CONNECTED: &str = "connected";
    pub const PLANNED: &str = "planned";
    pub const DECOMMISSIONING: &str = "decommissioning";

    pub const ALL: &[&str] = &[CONNECTED, PLANNED, DECOMMISSIONING];
}

/// Interface type values used by the provisioners
pub mod interface_type {
    pub const VIRTUAL: &str = "virtual";
    pub const BRIDGE: &str = "bridge";
    pub const LAG: &str = "lag";
    pub const BASE_T_1G: &str = "1000base-t";
}

/// FHRP protocol values
pub mod fhrp_protocol {
    pub const VRRP2: &str = "vrrp2";
    pub const VRRP3: &str = "vrrp3";
    pub const CARP: &str = "carp";
    pub const OTHER: &str = "other";

    pub const ALL: &[&str] = &[VRRP2, VRRP3, CARP, OTHER];
}

/// Provisioning run status values
pub mod run_status {
    pub const COMMITTED: &str = "committed";
    pub const DRY_RUN: &str = "dry-run";
    pub const FAILED: &str = "failed";
}

/// Provisioning operation names
pub mod operation {
    pub const CONNECT_CABLES: &str = "connect-cables";
    pub const CREATE_VLAN: &str = "create-vlan";
    pub const SET_VLAN_MEMBERSHIP: &str = "set-vlan-membership";
}
