// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! What the networking APIs can do.

use super::super::common::{NamingConstraints, Requirement};
use super::super::compute::ServerStatus;
use super::firewalls::{Direction, Permission, Protocol};
use super::{AddressType, IpVersion};

/// Static description of VLAN support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanCapabilities {
    /// Provider term for a VLAN.
    pub term: &'static str,
    /// Maximum number of VLANs, `None` when unknown.
    pub max_vlan_count: Option<u32>,
    /// Constraints on VLAN names.
    pub naming: NamingConstraints,
    /// Whether VLANs can be created.
    pub supports_creation: bool,
    /// Whether subnets are supported.
    pub supports_subnets: bool,
    /// Whether network interfaces are managed separately.
    pub supports_network_interfaces: bool,
    /// Whether VLANs are bound to a data center.
    pub data_center_constrained: bool,
    /// Supported IP versions.
    pub ip_versions: &'static [IpVersion],
}

/// Static description of static IP support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpCapabilities {
    /// Provider term for a static IP.
    pub term: &'static str,
    /// Address types that can be requested.
    pub requestable: &'static [AddressType],
    /// Supported IP versions.
    pub ip_versions: &'static [IpVersion],
    /// Whether port forwarding is supported.
    pub supports_forwarding: bool,
    /// Whether addresses can be requested for VLANs.
    pub supports_vlan_addresses: bool,
}

/// Static description of firewall support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallCapabilities {
    /// Provider term for a firewall.
    pub term: &'static str,
    /// Constraints on firewall names.
    pub naming: NamingConstraints,
    /// Whether rule precedence must be given.
    pub precedence_requirement: Requirement,
    /// Whether firewalls can be created.
    pub supports_creation: bool,
    /// Whether firewalls can be deleted.
    pub supports_deletion: bool,
    /// Whether zero is the highest precedence.
    pub zero_precedence_highest: bool,
    /// Supported rule directions.
    pub directions: &'static [Direction],
    /// Supported rule permissions.
    pub permissions: &'static [Permission],
    /// Supported rule protocols.
    pub protocols: &'static [Protocol],
}

/// Capabilities of VLAN support.
pub const VLAN_CAPABILITIES: VlanCapabilities = VlanCapabilities {
    term: "VLAN",
    max_vlan_count: None,
    naming: NamingConstraints::any(1, 255),
    supports_creation: true,
    supports_subnets: false,
    supports_network_interfaces: false,
    data_center_constrained: false,
    ip_versions: &[IpVersion::V4],
};

/// Capabilities of static IP support.
pub const IP_CAPABILITIES: IpCapabilities = IpCapabilities {
    term: "static IP",
    requestable: &[AddressType::Public],
    ip_versions: &[IpVersion::V4],
    supports_forwarding: false,
    supports_vlan_addresses: false,
};

/// Capabilities of firewall support.
pub const FIREWALL_CAPABILITIES: FirewallCapabilities = FirewallCapabilities {
    term: "firewall policy",
    naming: NamingConstraints::any(1, 255),
    precedence_requirement: Requirement::None,
    supports_creation: true,
    supports_deletion: false,
    zero_precedence_highest: true,
    directions: &[Direction::Ingress, Direction::Egress],
    permissions: &[Permission::Allow, Permission::Deny],
    protocols: &[Protocol::Tcp, Protocol::Udp],
};

impl IpCapabilities {
    /// Whether a static IP can be assigned to a server in this state.
    pub fn can_assign(&self, from: ServerStatus) -> bool {
        from == ServerStatus::Running
    }
}
