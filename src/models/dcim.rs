use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rack {
    pub id: i64,
    pub name: String,
    pub location_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRackRequest {
    pub name: String,
    pub location_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: i64,
    pub model: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRole {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Device is any racked or stand-alone piece of equipment: switches,
/// patch panels and access-port jacks alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub device_type_id: i64,
    // Enriched via JOIN (not stored)
    pub device_type: String,
    pub role_id: i64,
    // Enriched via JOIN (not stored)
    pub role: String,
    pub location_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CreateDeviceRequest references its type and role by natural key
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub device_type: String,
    pub role: String,
    pub location_id: i64,
    #[serde(default)]
    pub rack_id: Option<i64>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub tenant_id: Option<i64>,
}

/// 802.1Q mode of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    Access,
    Tagged,
}

impl InterfaceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceMode::Access => "access",
            InterfaceMode::Tagged => "tagged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(InterfaceMode::Access),
            "tagged" => Some(InterfaceMode::Tagged),
            _ => None,
        }
    }
}

/// VLAN membership of a switch port. Each variant carries exactly the
/// fields that mode allows, so an interface can never hold an untagged
/// VLAN and a tagged set at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanMembership {
    /// Access mode, optionally with an untagged VLAN
    Access(Option<i64>),
    /// Tagged mode carrying the given VLANs
    Tagged(Vec<i64>),
}

impl VlanMembership {
    /// Pick the membership implied by the number of selected VLANs:
    /// none → bare access, one → access untagged, more → tagged.
    pub fn for_selection(vlan_ids: &[i64]) -> Self {
        match vlan_ids {
            [] => VlanMembership::Access(None),
            [vlan] => VlanMembership::Access(Some(*vlan)),
            _ => VlanMembership::Tagged(vlan_ids.to_vec()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub id: i64,
    pub device_id: i64,
    // Enriched via JOIN (not stored)
    pub device_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub iface_type: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<InterfaceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untagged_vlan_id: Option<i64>,
    #[serde(default)]
    pub tagged_vlan_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interface {
    pub fn set_membership(&mut self, membership: VlanMembership) {
        match membership {
            VlanMembership::Access(untagged) => {
                self.mode = Some(InterfaceMode::Access);
                self.untagged_vlan_id = untagged;
                self.tagged_vlan_ids.clear();
            }
            VlanMembership::Tagged(vlans) => {
                self.mode = Some(InterfaceMode::Tagged);
                self.untagged_vlan_id = None;
                self.tagged_vlan_ids = vlans;
            }
        }
    }
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInterfaceRequest {
    pub device_id: i64,
    pub name: String,
    #[serde(rename = "type", default = "default_interface_type")]
    pub iface_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub lag_id: Option<i64>,
}

fn default_interface_type() -> String { super::interface_type::BASE_T_1G.to_string() }

fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RearPort {
    pub id: i64,
    pub device_id: i64,
    // Enriched via JOIN (not stored)
    pub device_name: String,
    pub name: String,
    pub positions: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRearPortRequest {
    pub device_id: i64,
    pub name: String,
    #[serde(default = "default_positions")]
    pub positions: i32,
}

fn default_positions() -> i32 { 1 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontPort {
    pub id: i64,
    pub device_id: i64,
    // Enriched via JOIN (not stored)
    pub device_name: String,
    pub name: String,
    pub rear_port_id: i64,
    pub rear_port_position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFrontPortRequest {
    pub device_id: i64,
    pub name: String,
    pub rear_port_id: i64,
    #[serde(default = "default_positions")]
    pub rear_port_position: i32,
}

/// Kind of object a cable end terminates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationKind {
    Interface,
    FrontPort,
    RearPort,
}

impl TerminationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationKind::Interface => "interface",
            TerminationKind::FrontPort => "front-port",
            TerminationKind::RearPort => "rear-port",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interface" => Some(TerminationKind::Interface),
            "front-port" => Some(TerminationKind::FrontPort),
            "rear-port" => Some(TerminationKind::RearPort),
            _ => None,
        }
    }
}

/// One endpoint of a cable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Termination {
    pub kind: TerminationKind,
    pub id: i64,
}

impl Termination {
    pub fn interface(id: i64) -> Self {
        Self { kind: TerminationKind::Interface, id }
    }

    pub fn front_port(id: i64) -> Self {
        Self { kind: TerminationKind::FrontPort, id }
    }

    pub fn rear_port(id: i64) -> Self {
        Self { kind: TerminationKind::RearPort, id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CableEnd {
    A,
    B,
}

impl CableEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            CableEnd::A => "A",
            CableEnd::B => "B",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(CableEnd::A),
            "B" => Some(CableEnd::B),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cable {
    pub id: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub cable_type: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    pub length_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub a_terminations: Vec<Termination>,
    pub b_terminations: Vec<Termination>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CreateCableRequest carries a cable and both of its ends
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCableRequest {
    #[serde(default = "default_cable_status")]
    pub status: String,
    #[serde(rename = "type", default)]
    pub cable_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub length_unit: String,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    pub a_terminations: Vec<Termination>,
    pub b_terminations: Vec<Termination>,
}

fn default_cable_status() -> String { super::cable_status::CONNECTED.to_string() }
