use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;
use crate::utils;

fn default_true() -> bool { true }

/// ConnectCablesRequest selects the access ports whose panel cables
/// should be inferred
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectCablesRequest {
    pub locations: Vec<i64>,
    #[serde(default)]
    pub exclude_ports: Vec<i64>,
    #[serde(default)]
    pub tenant: Option<i64>,
    #[serde(default = "default_true")]
    pub commit: bool,
}

impl ConnectCablesRequest {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.locations.is_empty() {
            return Err(ProvisionError::invalid("request", "at least one location is required"));
        }
        Ok(())
    }
}

/// CreateVlanRequest describes the VLAN bundle to converge on the exit switches
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVlanRequest {
    pub vlan_name: String,
    pub vlan_id: i64,
    pub tenant: i64,
    #[serde(default)]
    pub net4: Option<IpNetwork>,
    #[serde(default)]
    pub net6: Option<IpNetwork>,
    #[serde(default = "default_true")]
    pub firewall: bool,
    #[serde(default = "default_true")]
    pub commit: bool,
}

impl CreateVlanRequest {
    pub const MAX_NAME_LEN: usize = 15;
    pub const MIN_VID: i64 = 2;
    pub const MAX_VID: i64 = 4094;

    pub fn validate(&self) -> Result<(), ProvisionError> {
        if !utils::is_valid_vlan_name(&self.vlan_name, Self::MAX_NAME_LEN) {
            return Err(ProvisionError::invalid(
                "vlan_name",
                format!(
                    "'{}' must be 1-{} lowercase letters or hyphens",
                    self.vlan_name,
                    Self::MAX_NAME_LEN
                ),
            ));
        }
        if self.vlan_id < Self::MIN_VID || self.vlan_id > Self::MAX_VID {
            return Err(ProvisionError::invalid(
                "vlan_id",
                format!("{} is outside {}-{}", self.vlan_id, Self::MIN_VID, Self::MAX_VID),
            ));
        }
        if let Some(net) = self.net4 {
            if !net.is_ipv4() {
                return Err(ProvisionError::invalid("net4", format!("{} is not an IPv4 network", net)));
            }
        }
        if let Some(net) = self.net6 {
            if !net.is_ipv6() {
                return Err(ProvisionError::invalid("net6", format!("{} is not an IPv6 network", net)));
            }
        }
        Ok(())
    }

    /// Supplied networks in provisioning order (IPv4 first)
    pub fn networks(&self) -> Vec<IpNetwork> {
        self.net4.into_iter().chain(self.net6).collect()
    }
}

/// SetVlanRequest selects switch ports directly or through access-port
/// traces and the VLANs to put them in
#[derive(Debug, Clone, Deserialize)]
pub struct SetVlanRequest {
    #[serde(default)]
    pub access_ports: Vec<i64>,
    #[serde(default)]
    pub switch: Option<i64>,
    #[serde(default)]
    pub switch_ports: Vec<i64>,
    #[serde(default)]
    pub vlans: Vec<i64>,
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_true")]
    pub commit: bool,
}

impl SetVlanRequest {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.vlans.iter().find(|v| !seen.insert(**v)) {
            return Err(ProvisionError::invalid("vlans", format!("VLAN {} selected twice", dup)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Failure,
}

/// One narrated line of a provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// ProvisionRun is the report of one provisioning invocation, returned to
/// the caller and kept in the run history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRun {
    pub id: String,
    pub operation: String,
    pub status: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub log: Vec<LogEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlan_request(name: &str, vid: i64) -> CreateVlanRequest {
        CreateVlanRequest {
            vlan_name: name.to_string(),
            vlan_id: vid,
            tenant: 1,
            net4: None,
            net6: None,
            firewall: true,
            commit: true,
        }
    }

    #[test]
    fn test_vlan_request_bounds() {
        assert!(vlan_request("lab-net", 2).validate().is_ok());
        assert!(vlan_request("lab-net", 4094).validate().is_ok());
        assert!(vlan_request("lab-net", 1).validate().is_err());
        assert!(vlan_request("lab-net", 4095).validate().is_err());
        assert!(vlan_request("Lab", 100).validate().is_err());
        assert!(vlan_request("lab_net", 100).validate().is_err());
        assert!(vlan_request("a-very-long-vlan-name", 100).validate().is_err());
        assert!(vlan_request("", 100).validate().is_err());
    }

    #[test]
    fn test_vlan_request_address_families() {
        let mut req = vlan_request("lab", 100);
        req.net4 = Some("2001:db8::/64".parse().unwrap());
        assert!(req.validate().is_err());

        req.net4 = Some("10.0.0.0/24".parse().unwrap());
        req.net6 = Some("2001:db8::/64".parse().unwrap());
        assert!(req.validate().is_ok());
        assert_eq!(req.networks().len(), 2);
        assert!(req.networks()[0].is_ipv4());
    }

    #[test]
    fn test_set_vlan_request_rejects_repeated_vlans() {
        let req = SetVlanRequest {
            access_ports: vec![],
            switch: None,
            switch_ports: vec![],
            vlans: vec![1],
            enable: true,
            commit: true,
        };
        assert!(req.validate().is_ok());

        let req = SetVlanRequest { switch_ports: vec![4], vlans: vec![1, 1], ..req };
        assert!(req.validate().is_err());
    }
}
