//! Naming and rack-position conventions that tie access ports, patch panels
//! and switch interfaces together.
//!
//! An access port named `<panel>.<port>` is a jack wired to front port
//! `<port>` of panel `panel-<panel>`. The panel shares its rack with a
//! switch mounted directly above or below it, and each panel port is
//! patched into one of `lanes_per_port` consecutive switch interfaces. Which
//! lane depends on whether the panel sits below or above the switch.

use regex_lite::Regex;

use crate::error::ProvisionError;

/// Site wiring convention. The defaults encode two switch interfaces per
/// panel port: a panel below its switch uses the even interface (`2p`), a
/// panel above it uses the odd one (`2p-1`).
#[derive(Debug, Clone)]
pub struct WiringPolicy {
    /// Regex with two capture groups: panel number, port number
    pub access_port_pattern: String,
    /// Panel device name; `{panel}` is replaced by the panel number
    pub panel_name_template: String,
    /// Regex matched against switch interface names; `{index}` is replaced
    /// by the computed interface index
    pub interface_name_template: String,
    pub lanes_per_port: u32,
    pub below_offset: u32,
    pub above_offset: u32,
}

impl Default for WiringPolicy {
    fn default() -> Self {
        Self {
            access_port_pattern: r"^([0-9]+)\.([0-9]+)$".to_string(),
            panel_name_template: "panel-{panel}".to_string(),
            interface_name_template: ".*[^0-9]{index}$".to_string(),
            lanes_per_port: 2,
            below_offset: 0,
            above_offset: 1,
        }
    }
}

/// Decoded access port name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPortName {
    /// Panel number exactly as written, leading zeros kept
    pub panel: String,
    pub port: u32,
}

/// WiringPolicy with its port pattern compiled once per run
pub struct Conventions<'a> {
    policy: &'a WiringPolicy,
    access_port_re: Regex,
}

impl<'a> Conventions<'a> {
    pub fn new(policy: &'a WiringPolicy) -> Result<Self, ProvisionError> {
        let access_port_re = Regex::new(&policy.access_port_pattern).map_err(|e| {
            ProvisionError::invalid("access port pattern", e.to_string())
        })?;
        Ok(Self { policy, access_port_re })
    }

    /// Split an access port name into panel and port number. Names that do
    /// not follow the convention yield `None`.
    pub fn parse_access_port(&self, name: &str) -> Option<AccessPortName> {
        let caps = self.access_port_re.captures(name)?;
        let panel = caps.get(1)?.as_str().to_string();
        let port = caps.get(2)?.as_str().parse().ok()?;
        Some(AccessPortName { panel, port })
    }

    pub fn panel_name(&self, panel: &str) -> String {
        self.policy.panel_name_template.replace("{panel}", panel)
    }

    /// Front port name on the panel for a port number ("07" -> "7")
    pub fn front_port_name(&self, port: u32) -> String {
        port.to_string()
    }

    /// Index of the switch interface a panel port is patched into.
    /// `None` when the policy offsets push the index below 1.
    pub fn interface_index(&self, port: u32, panel_position: i32, switch_position: i32) -> Option<u32> {
        let offset = if panel_position < switch_position {
            self.policy.below_offset
        } else {
            self.policy.above_offset
        };
        self.policy
            .lanes_per_port
            .checked_mul(port)?
            .checked_sub(offset)
            .filter(|idx| *idx > 0)
    }

    /// Matcher for switch interface names ending in `index`
    pub fn interface_matcher(&self, index: u32) -> Result<Regex, ProvisionError> {
        let pattern = self
            .policy
            .interface_name_template
            .replace("{index}", &index.to_string());
        Regex::new(&pattern).map_err(|e| ProvisionError::invalid("interface name template", e.to_string()))
    }
}

/// Rack units directly above and below a position
pub fn adjacent_positions(position: i32) -> [i32; 2] {
    [position + 1, position - 1]
}
