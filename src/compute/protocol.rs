// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Key/value structures and protocol bits for the servers API.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use super::super::common::{Architecture, KvObject, Platform};
use super::super::utils;
use super::products;

/// Number of drive slots (`block:N`) a server has.
pub const MAX_BLOCK_DEVICES: u8 = 8;

/// Boot device used when the server does not name one.
pub const DEFAULT_BOOT_DEVICE: &str = "ide:0:0";

protocol_enum! {
    #[doc = "Possible server states."]
    enum ServerStatus {
        #[doc = "Transitional or unknown state."]
        Pending = "pending",
        #[doc = "Powered on."]
        Running = "active",
        #[doc = "Powered off."]
        Stopped = "stopped",
        #[doc = "Paused by the hypervisor."]
        Paused = "paused",
        #[doc = "Destroyed."]
        Terminated = "dead"
    }
}

impl ServerStatus {
    /// Map a state reported by the API.
    ///
    /// Unknown states are reported as `Pending`.
    pub fn from_api(value: Option<&str>) -> ServerStatus {
        let value = match value {
            Some(value) => value.trim().to_lowercase(),
            None => return ServerStatus::Pending,
        };

        match value.as_str() {
            "stopped" => ServerStatus::Stopped,
            "active" => ServerStatus::Running,
            "paused" => ServerStatus::Paused,
            "dead" | "dumped" => ServerStatus::Terminated,
            s if s.starts_with("imaging") => ServerStatus::Pending,
            other => {
                warn!("Unknown server status {}", other);
                ServerStatus::Pending
            }
        }
    }
}

impl Default for ServerStatus {
    fn default() -> ServerStatus {
        ServerStatus::Pending
    }
}

/// A server as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ServerStatus,
    pub boot_device: String,
    pub image_id: Option<String>,
    pub vlan_id: Option<String>,
    pub drives: BTreeMap<u8, String>,
    pub assigned_ip_id: Option<String>,
    pub public_addresses: Vec<String>,
    pub private_addresses: Vec<String>,
    pub owner: Option<String>,
    pub root_user: Option<String>,
    pub root_password: Option<String>,
    pub cpu_mhz: u32,
    pub cpu_count: u32,
    pub memory_mb: u32,
    pub product_id: String,
    pub architecture: Architecture,
    pub platform: Platform,
    pub persistent: bool,
    pub region_id: String,
    pub data_center_id: String,
}

fn usable_address(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "auto")
}

impl Server {
    /// Map a key/value object, `None` if it has no server ID.
    pub fn from_kv(object: &KvObject, region_id: &str) -> Option<Server> {
        let id = object.get_non_empty("server")?.to_string();

        let boot_device = object
            .get_non_empty("boot")
            .unwrap_or(DEFAULT_BOOT_DEVICE)
            .to_string();
        let image_id = object.get_non_empty(&boot_device).map(ToString::to_string);
        let vlan_id = object
            .get_non_empty("nic:0:vlan")
            .or_else(|| object.get_non_empty("nic:1:vlan"))
            .map(ToString::to_string);

        let drives = (0..MAX_BLOCK_DEVICES)
            .filter_map(|n| {
                object
                    .get_non_empty(&format!("block:{}", n))
                    .map(|drive| (n, drive.to_string()))
            })
            .collect();

        let assigned_ip_id = usable_address(object.get("nic:0:dhcp")).map(ToString::to_string);
        let mut addresses: Vec<&str> = Vec::new();
        addresses.extend(usable_address(object.get("nic:0:dhcp")));
        addresses.extend(usable_address(object.get("vnc:ip")));
        for nic in 1..10 {
            match object.get(&format!("nic:{}:dhcp", nic)) {
                Some(value) => addresses.extend(usable_address(Some(value))),
                None => break,
            }
        }
        addresses.sort_unstable();
        addresses.dedup();
        let (private_addresses, public_addresses): (Vec<String>, Vec<String>) = addresses
            .into_iter()
            .map(ToString::to_string)
            .partition(|addr| utils::is_private_address(addr));

        let root_password = object.get("vnc:password").map(ToString::to_string);
        let root_user = root_password.as_ref().map(|_| "root".to_string());

        let cpu_mhz = object.parse_value("cpu").unwrap_or(1000);
        let cpu_count = object.parse_value("smp").unwrap_or(1);
        let memory_mb = object.parse_value("mem").unwrap_or(512);
        let product_id = products::product_id(memory_mb, cpu_mhz, cpu_count);

        let name = object
            .get_non_empty("name")
            .map(ToString::to_string)
            .unwrap_or_else(|| id.clone());
        let description = name.clone();

        Some(Server {
            id,
            name,
            description,
            status: ServerStatus::from_api(object.get("status")),
            boot_device,
            image_id,
            vlan_id,
            drives,
            assigned_ip_id,
            public_addresses,
            private_addresses,
            owner: object.get_non_empty("user").map(ToString::to_string),
            root_user,
            root_password,
            cpu_mhz,
            cpu_count,
            memory_mb,
            product_id,
            architecture: Architecture::I64,
            platform: Platform::Unknown,
            persistent: true,
            region_id: region_id.to_string(),
            data_center_id: format!("{}-a", region_id),
        })
    }

    /// Device slot holding the drive, if it is attached.
    pub fn device_of(&self, drive_id: &str) -> Option<u8> {
        self.drives
            .iter()
            .find(|(_, drive)| drive.as_str() == drive_id)
            .map(|(n, _)| *n)
    }
}

#[cfg(test)]
mod test {
    use super::super::super::common::KvObject;
    use super::{Server, ServerStatus};

    const SERVER: &str = "server\t7f3c2d5e-1b2a-4c3d-8e9f-0a1b2c3d4e5f\n\
                          name\tweb\n\
                          status\tactive\n\
                          cpu\t2000\n\
                          smp\t2\n\
                          mem\t1024\n\
                          ide:0:0\tdrive-boot\n\
                          block:1\tdrive-data\n\
                          block:3\n\
                          nic:0:dhcp\t31.171.246.10\n\
                          nic:0:vlan\t\n\
                          nic:1:vlan\tvlan-1\n\
                          nic:1:dhcp\t10.0.0.5\n\
                          vnc:ip\t31.171.246.10\n\
                          vnc:password\tsecret\n\
                          user\tacc-1\n";

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerStatus::from_api(Some("stopped")), ServerStatus::Stopped);
        assert_eq!(ServerStatus::from_api(Some("ACTIVE")), ServerStatus::Running);
        assert_eq!(ServerStatus::from_api(Some("paused")), ServerStatus::Paused);
        assert_eq!(ServerStatus::from_api(Some("dumped")), ServerStatus::Terminated);
        assert_eq!(ServerStatus::from_api(Some("dead")), ServerStatus::Terminated);
        assert_eq!(ServerStatus::from_api(Some("imaging 50%")), ServerStatus::Pending);
        assert_eq!(ServerStatus::from_api(Some("weird")), ServerStatus::Pending);
        assert_eq!(ServerStatus::from_api(None), ServerStatus::Pending);
    }

    #[test]
    fn test_server_mapping() {
        let server = Server::from_kv(&KvObject::parse(SERVER), "eu-ch1").unwrap();
        assert_eq!(server.id, "7f3c2d5e-1b2a-4c3d-8e9f-0a1b2c3d4e5f");
        assert_eq!(server.name, "web");
        assert_eq!(server.description, "web");
        assert_eq!(server.status, ServerStatus::Running);
        assert_eq!(server.image_id.as_deref(), Some("drive-boot"));
        assert_eq!(server.vlan_id.as_deref(), Some("vlan-1"));
        assert_eq!(server.drives.len(), 1);
        assert_eq!(server.device_of("drive-data"), Some(1));
        assert_eq!(server.device_of("drive-boot"), None);
        assert_eq!(server.assigned_ip_id.as_deref(), Some("31.171.246.10"));
        assert_eq!(server.public_addresses, vec!["31.171.246.10".to_string()]);
        assert_eq!(server.private_addresses, vec!["10.0.0.5".to_string()]);
        assert_eq!(server.root_user.as_deref(), Some("root"));
        assert_eq!(server.root_password.as_deref(), Some("secret"));
        assert_eq!(server.owner.as_deref(), Some("acc-1"));
        assert_eq!(server.product_id, "1024:2000:2");
        assert_eq!(server.data_center_id, "eu-ch1-a");
        assert!(server.persistent);
    }

    #[test]
    fn test_server_mapping_defaults() {
        let obj = KvObject::parse("server abc\nboot ide:0:1\nide:0:1 img\ncpu fast\nnic:0:dhcp auto\n");
        let server = Server::from_kv(&obj, "zrh").unwrap();
        assert_eq!(server.name, "abc");
        assert_eq!(server.status, ServerStatus::Pending);
        assert_eq!(server.image_id.as_deref(), Some("img"));
        assert_eq!(server.product_id, "512:1000");
        assert_eq!(server.assigned_ip_id, None);
        assert!(server.public_addresses.is_empty());
        assert_eq!(server.root_user, None);
    }

    #[test]
    fn test_server_mapping_requires_id() {
        assert!(Server::from_kv(&KvObject::parse("name web\n"), "zrh").is_none());
    }
}
