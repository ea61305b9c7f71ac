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

//! What the servers API can do.

use super::super::common::{NamingConstraints, Requirement};
use super::protocol::ServerStatus;

/// Static description of the servers API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapabilities {
    /// Provider term for a virtual machine.
    pub term: &'static str,
    /// Maximum number of servers, `None` when unknown.
    pub max_server_count: Option<u32>,
    /// Constraints on server names.
    pub naming: NamingConstraints,
    /// Whether a data center must be given on launch.
    pub data_center_requirement: Requirement,
    /// Whether a machine image must be given on launch.
    pub image_requirement: Requirement,
    /// Whether a root password must be given on launch.
    pub password_requirement: Requirement,
    /// Whether a root volume must be given on launch.
    pub root_volume_requirement: Requirement,
    /// Whether an SSH key must be given on launch.
    pub shell_key_requirement: Requirement,
    /// Whether a static IP must be given on launch.
    pub static_ip_requirement: Requirement,
    /// Whether a subnet must be given on launch.
    pub subnet_requirement: Requirement,
    /// Whether a VLAN must be given on launch.
    pub vlan_requirement: Requirement,
    /// Whether user data is supported.
    pub supports_user_data: bool,
    /// Whether spot servers are supported.
    pub supports_spot_servers: bool,
    /// Whether servers can be cloned.
    pub supports_clone: bool,
    /// Whether servers can be rebooted.
    pub supports_reboot: bool,
    /// Whether servers can be paused.
    pub supports_pause: bool,
    /// Whether servers can be suspended.
    pub supports_suspend: bool,
}

/// Capabilities of the servers API.
pub const CAPABILITIES: ServerCapabilities = ServerCapabilities {
    term: "server",
    max_server_count: None,
    naming: NamingConstraints::alphanumeric(1, 64),
    data_center_requirement: Requirement::None,
    image_requirement: Requirement::Required,
    password_requirement: Requirement::Optional,
    root_volume_requirement: Requirement::None,
    shell_key_requirement: Requirement::None,
    static_ip_requirement: Requirement::None,
    subnet_requirement: Requirement::None,
    vlan_requirement: Requirement::Optional,
    supports_user_data: false,
    supports_spot_servers: false,
    supports_clone: true,
    supports_reboot: true,
    supports_pause: false,
    supports_suspend: false,
};

impl ServerCapabilities {
    /// Whether a server in this state can be cloned.
    pub fn can_clone(&self, from: ServerStatus) -> bool {
        from == ServerStatus::Stopped
    }

    /// Whether a server in this state can be started.
    pub fn can_start(&self, from: ServerStatus) -> bool {
        from != ServerStatus::Running
    }

    /// Whether a server in this state can be stopped.
    pub fn can_stop(&self, from: ServerStatus) -> bool {
        from != ServerStatus::Stopped
    }

    /// Whether a server in this state can be terminated.
    pub fn can_terminate(&self, from: ServerStatus) -> bool {
        from == ServerStatus::Stopped
    }

    /// Servers can be rebooted in any state.
    pub fn can_reboot(&self, _from: ServerStatus) -> bool {
        true
    }

    /// Whether drives can be attached or detached in this state.
    pub fn can_change_drives(&self, from: ServerStatus) -> bool {
        from == ServerStatus::Stopped
    }

    /// Relative cost of a server in this state.
    pub fn cost_factor(&self, state: ServerStatus) -> u32 {
        if state == ServerStatus::Running {
            100
        } else {
            0
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::protocol::ServerStatus;
    use super::CAPABILITIES;

    #[test]
    fn test_transitions() {
        assert!(CAPABILITIES.can_clone(ServerStatus::Stopped));
        assert!(!CAPABILITIES.can_clone(ServerStatus::Running));
        assert!(CAPABILITIES.can_start(ServerStatus::Stopped));
        assert!(!CAPABILITIES.can_start(ServerStatus::Running));
        assert!(!CAPABILITIES.can_stop(ServerStatus::Stopped));
        assert!(CAPABILITIES.can_terminate(ServerStatus::Stopped));
        assert!(CAPABILITIES.can_reboot(ServerStatus::Paused));
        assert_eq!(CAPABILITIES.cost_factor(ServerStatus::Running), 100);
        assert_eq!(CAPABILITIES.cost_factor(ServerStatus::Stopped), 0);
    }

    #[test]
    fn test_naming() {
        assert!(CAPABILITIES.naming.is_valid("web01"));
        assert!(!CAPABILITIES.naming.is_valid("web_01"));
    }
}
