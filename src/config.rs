//! Generator configuration.
//!
//! A generation request is a YAML document listing the sub-networks to build
//! plus a few global toggles:
//!
//! ```yaml
//! central_device: router        # or l3_switch
//! include_uplink: true          # firewall + internet cloud above the core
//! auto_hosts: true              # 2 PCs per LAN, 1 server per DMZ
//! infrastructure:
//!   enabled: true
//!   label: Headquarters
//! networks:
//!   - name: Admin
//!     class: LAN
//!     cidr_address: 192.168.10.0
//!     cidr_mask: 24
//!     vlan_id: 10
//!   - name: Web
//!     class: DMZ
//! ```

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::topology::types::DeviceRole;

/// Mask used when a network has an address but no mask
pub const DEFAULT_CIDR_MASK: u8 = 24;

/// Highest usable 802.1Q VLAN id
pub const MAX_VLAN_ID: u16 = 4094;

/// Kind of generated sub-network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkClass {
    #[serde(rename = "LAN", alias = "lan", alias = "Lan")]
    Lan,
    #[serde(rename = "DMZ", alias = "dmz", alias = "Dmz")]
    Dmz,
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lan => write!(f, "LAN"),
            Self::Dmz => write!(f, "DMZ"),
        }
    }
}

/// Device every generated sub-network uplinks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralDevice {
    #[default]
    Router,
    L3Switch,
}

impl CentralDevice {
    pub fn role(&self) -> DeviceRole {
        match self {
            Self::Router => DeviceRole::Router,
            Self::L3Switch => DeviceRole::L3Switch,
        }
    }
}

/// One sub-network to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub class: NetworkClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_address: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_mask: Option<u8>,
    /// Auto-assigned when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
}

impl NetworkSpec {
    pub fn new(name: impl Into<String>, class: NetworkClass) -> Self {
        Self {
            name: name.into(),
            class,
            cidr_address: None,
            cidr_mask: None,
            vlan_id: None,
        }
    }

    pub fn with_cidr(mut self, address: Ipv4Addr, mask: u8) -> Self {
        self.cidr_address = Some(address);
        self.cidr_mask = Some(mask);
        self
    }

    pub fn with_vlan(mut self, vlan_id: u16) -> Self {
        self.vlan_id = Some(vlan_id);
        self
    }

    /// Declared network, if an address was given. The mask defaults to /24.
    pub fn cidr(&self) -> Option<Ipv4Network> {
        let address = self.cidr_address?;
        Ipv4Network::new(address, self.cidr_mask.unwrap_or(DEFAULT_CIDR_MASK)).ok()
    }

    /// Parse the compact list syntax: comma separated `name [a.b.c.d[/n]] [vlan]`
    /// entries, e.g. `"Admin 192.168.10.0/24 10, Guests"`.
    ///
    /// Tokens are classified by shape, so names may contain spaces.
    ///
    /// # Examples
    /// ```
    /// use netsketch::config::{NetworkClass, NetworkSpec};
    ///
    /// let specs = NetworkSpec::parse_list("Admin 192.168.10.0/24 10, Guest Wifi", NetworkClass::Lan).unwrap();
    /// assert_eq!(specs.len(), 2);
    /// assert_eq!(specs[0].vlan_id, Some(10));
    /// assert_eq!(specs[1].name, "Guest Wifi");
    /// assert_eq!(specs[1].cidr(), None);
    /// ```
    pub fn parse_list(text: &str, class: NetworkClass) -> Result<Vec<NetworkSpec>, ValidationError> {
        text.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Self::parse_entry(entry, class))
            .collect()
    }

    fn parse_entry(entry: &str, class: NetworkClass) -> Result<NetworkSpec, ValidationError> {
        let mut name_parts = Vec::new();
        let mut spec = NetworkSpec::new("", class);

        for token in entry.split_whitespace() {
            if let Some((addr, mask)) = token.split_once('/') {
                let address = addr
                    .parse::<Ipv4Addr>()
                    .map_err(|_| ValidationError::InvalidEntry(entry.to_string()))?;
                let mask = mask
                    .parse::<u8>()
                    .map_err(|_| ValidationError::InvalidEntry(entry.to_string()))?;
                spec = spec.with_cidr(address, mask);
            } else if let Ok(address) = token.parse::<Ipv4Addr>() {
                spec.cidr_address = Some(address);
            } else if token.chars().all(|c| c.is_ascii_digit()) && !name_parts.is_empty() {
                let vlan = token
                    .parse::<u16>()
                    .map_err(|_| ValidationError::InvalidEntry(entry.to_string()))?;
                spec.vlan_id = Some(vlan);
            } else {
                name_parts.push(token);
            }
        }

        if name_parts.is_empty() {
            return Err(ValidationError::InvalidEntry(entry.to_string()));
        }
        spec.name = name_parts.join(" ");
        Ok(spec)
    }
}

/// Boundary box drawn around the generated region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_infrastructure_label")]
    pub label: String,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label: default_infrastructure_label(),
        }
    }
}

/// Complete generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub central_device: CentralDevice,
    /// Add a firewall and an internet cloud above the central device
    #[serde(default = "default_true")]
    pub include_uplink: bool,
    /// Populate LANs with two PCs and DMZs with one server
    #[serde(default = "default_true")]
    pub auto_hosts: bool,
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
    #[serde(default)]
    pub networks: Vec<NetworkSpec>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            central_device: CentralDevice::default(),
            include_uplink: true,
            auto_hosts: true,
            infrastructure: InfrastructureConfig::default(),
            networks: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        let mut vlans = HashSet::new();

        for (index, network) in self.networks.iter().enumerate() {
            let name = network.name.trim();
            if name.is_empty() {
                return Err(ValidationError::EmptyName(index));
            }
            if !names.insert(name.to_ascii_lowercase()) {
                return Err(ValidationError::DuplicateName(name.to_string()));
            }
            if let Some(mask) = network.cidr_mask {
                if mask > 32 {
                    return Err(ValidationError::InvalidMask {
                        network: name.to_string(),
                        mask,
                    });
                }
            }
            if let Some(vlan) = network.vlan_id {
                if !(1..=MAX_VLAN_ID).contains(&vlan) {
                    return Err(ValidationError::InvalidVlan {
                        network: name.to_string(),
                        vlan,
                    });
                }
                if !vlans.insert(vlan) {
                    return Err(ValidationError::DuplicateVlan(vlan));
                }
            }
        }

        Ok(())
    }

    /// Networks of one class, in declaration order
    pub fn networks_of(&self, class: NetworkClass) -> impl Iterator<Item = &NetworkSpec> + '_ {
        self.networks.iter().filter(move |n| n.class == class)
    }
}

fn default_true() -> bool {
    true
}

fn default_infrastructure_label() -> String {
    "Headquarters".to_string()
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Network #{0} has an empty name")]
    EmptyName(usize),
    #[error("Network name '{0}' is used more than once")]
    DuplicateName(String),
    #[error("Network '{network}' has invalid mask /{mask}")]
    InvalidMask { network: String, mask: u8 },
    #[error("Network '{network}' has VLAN {vlan} outside 1-4094")]
    InvalidVlan { network: String, vlan: u16 },
    #[error("VLAN {0} is assigned to more than one network")]
    DuplicateVlan(u16),
    #[error("Cannot parse network entry '{0}'")]
    InvalidEntry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let yaml = r#"
networks:
  - name: Admin
    class: LAN
    cidr_address: 192.168.10.0
    vlan_id: 10
  - name: Web
    class: dmz
"#;
        let config: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.central_device, CentralDevice::Router);
        assert!(config.include_uplink);
        assert!(config.auto_hosts);
        assert!(config.infrastructure.enabled);
        assert_eq!(config.infrastructure.label, "Headquarters");
        assert_eq!(config.networks[0].cidr().unwrap().to_string(), "192.168.10.0/24");
        assert_eq!(config.networks[1].class, NetworkClass::Dmz);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_central_device_l3_switch() {
        let config: GeneratorConfig = serde_yaml::from_str("central_device: l3_switch\ninclude_uplink: false\n").unwrap();
        assert_eq!(config.central_device.role(), DeviceRole::L3Switch);
        assert!(!config.include_uplink);
        assert!(config.networks.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let config = |networks: Vec<NetworkSpec>| GeneratorConfig { networks, ..GeneratorConfig::default() };

        assert_eq!(
            config(vec![NetworkSpec::new(" ", NetworkClass::Lan)]).validate(),
            Err(ValidationError::EmptyName(0))
        );
        assert!(matches!(
            config(vec![NetworkSpec::new("A", NetworkClass::Lan).with_cidr(Ipv4Addr::new(10, 0, 0, 0), 33)]).validate(),
            Err(ValidationError::InvalidMask { mask: 33, .. })
        ));
        assert!(matches!(
            config(vec![NetworkSpec::new("A", NetworkClass::Lan).with_vlan(0)]).validate(),
            Err(ValidationError::InvalidVlan { vlan: 0, .. })
        ));
        assert_eq!(
            config(vec![
                NetworkSpec::new("A", NetworkClass::Lan).with_vlan(10),
                NetworkSpec::new("B", NetworkClass::Dmz).with_vlan(10),
            ])
            .validate(),
            Err(ValidationError::DuplicateVlan(10))
        );
        assert_eq!(
            config(vec![NetworkSpec::new("A", NetworkClass::Lan), NetworkSpec::new("a", NetworkClass::Dmz)]).validate(),
            Err(ValidationError::DuplicateName("a".to_string()))
        );
    }

    #[test]
    fn test_parse_list() {
        let specs = NetworkSpec::parse_list("Admin 192.168.10.0/24 10, Users 192.168.20.0/25 20,, Guests", NetworkClass::Lan).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, "Admin");
        assert_eq!(specs[0].cidr().unwrap().to_string(), "192.168.10.0/24");
        assert_eq!(specs[1].cidr_mask, Some(25));
        assert_eq!(specs[1].vlan_id, Some(20));
        assert_eq!(specs[2], NetworkSpec::new("Guests", NetworkClass::Lan));

        let bare = NetworkSpec::parse_list("Web 10.0.0.0", NetworkClass::Dmz).unwrap();
        assert_eq!(bare[0].cidr().unwrap().to_string(), "10.0.0.0/24");
        assert_eq!(bare[0].class, NetworkClass::Dmz);
    }

    #[test]
    fn test_parse_list_rejects_garbage() {
        assert!(matches!(
            NetworkSpec::parse_list("Admin 300.1.1.0/24", NetworkClass::Lan),
            Err(ValidationError::InvalidEntry(_))
        ));
        assert!(NetworkSpec::parse_list("192.168.1.0/24", NetworkClass::Lan).is_err());
        assert!(NetworkSpec::parse_list("", NetworkClass::Lan).unwrap().is_empty());
    }
}
