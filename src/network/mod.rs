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

//! Networking: VLANs, static IPs and firewall policies.
//!
//! VLANs and static IPs use the key/value API, firewall policies use the JSON
//! API. Assigning and releasing static IPs changes the server configuration
//! and thus requires stopping the server.

mod api;
pub mod capabilities;
mod firewalls;
mod ips;
mod protocol;
mod vlans;

pub use self::capabilities::{FirewallCapabilities, IpCapabilities, VlanCapabilities};
pub use self::firewalls::{Direction, Firewall, FirewallRule, Permission, Protocol, RuleTarget};
pub use self::ips::IpAddress;
pub use self::protocol::{AddressType, IpVersion};
pub use self::vlans::{Vlan, VlanResources, VlanState};
