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

//! Key/value and JSON structures for the networking APIs.

#![allow(missing_docs)]

use serde_json::{Map, Value};

use super::super::common::protocol::{empty_as_none, ListMeta};
use super::super::common::KvObject;

protocol_enum! {
    #[doc = "IP protocol version."]
    enum IpVersion {
        #[doc = "IPv4."]
        V4 = "ipv4",
        #[doc = "IPv6."]
        V6 = "ipv6"
    }
}

protocol_enum! {
    #[doc = "Whether an address is reachable from the Internet."]
    enum AddressType {
        #[doc = "Reachable from the Internet."]
        Public = "public",
        #[doc = "Reachable only inside the cloud."]
        Private = "private"
    }
}

/// A resource (VLAN or IP) as reported by the key/value API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub name: Option<String>,
    pub user: Option<String>,
    pub resource_type: Option<String>,
}

impl Resource {
    /// Map a key/value object, `None` if it has no resource ID.
    pub fn from_kv(object: &KvObject) -> Option<Resource> {
        Some(Resource {
            id: object.get_non_empty("resource")?.to_string(),
            name: object.get_non_empty("name").map(ToString::to_string),
            user: object.get_non_empty("user").map(ToString::to_string),
            resource_type: object.get_non_empty("type").map(ToString::to_string),
        })
    }

    /// Whether the resource is of the type and visible to the account.
    pub fn is_usable(&self, resource_type: &str, account: &str) -> bool {
        self.user.as_deref().map(|u| u == account).unwrap_or(true)
            && self
                .resource_type
                .as_deref()
                .map(|t| t == resource_type)
                .unwrap_or(true)
    }
}

/// A firewall rule as stored in a policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub ip_proto: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A firewall policy.
///
/// Unknown fields are kept so that the policy can be written back as a whole.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FirewallPolicy {
    pub uuid: String,
    #[serde(deserialize_with = "empty_as_none", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page of firewall policies.
#[derive(Debug, Clone, Deserialize)]
pub struct FirewallPolicyPage {
    #[serde(default)]
    pub objects: Vec<FirewallPolicy>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

/// An object to create, only the name is set.
#[derive(Debug, Clone, Serialize)]
pub struct NamedObject {
    pub name: String,
}

/// A request to create objects.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest {
    pub objects: Vec<NamedObject>,
}

#[cfg(test)]
mod test {
    use super::super::super::common::KvObject;
    use super::{FirewallPolicy, FirewallPolicyPage, Resource};

    #[test]
    fn test_resource_mapping() {
        let res = Resource::from_kv(&KvObject::parse("resource v1\nname net\ntype vlan\nuser me\n"))
            .unwrap();
        assert_eq!(res.id, "v1");
        assert!(res.is_usable("vlan", "me"));
        assert!(!res.is_usable("ip", "me"));
        assert!(!res.is_usable("vlan", "other"));

        let res = Resource::from_kv(&KvObject::parse("resource 1.2.3.4\nuser\n")).unwrap();
        assert!(res.is_usable("ip", "me"));
        assert!(Resource::from_kv(&KvObject::parse("name x\n")).is_none());
    }

    #[test]
    fn test_policy_keeps_unknown_fields() {
        let body = r#"{
            "uuid": "fw1",
            "name": "web",
            "resource_uri": "/api/2.0/fwpolicies/fw1/",
            "servers": [],
            "rules": [
                {"action": "accept", "direction": "in", "ip_proto": "tcp",
                 "dst_port": "80", "src_ip": "", "dst_ip": null, "comment": "http"}
            ]
        }"#;
        let policy: FirewallPolicy = serde_json::from_str(body).unwrap();
        assert_eq!(policy.uuid, "fw1");
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].src_ip, None);
        assert_eq!(policy.rules[0].dst_port.as_deref(), Some("80"));

        let value = serde_json::to_value(&policy).unwrap();
        assert_eq!(value["resource_uri"], "/api/2.0/fwpolicies/fw1/");
        assert_eq!(value["rules"][0]["comment"], "http");
        assert!(value["rules"][0].get("src_ip").is_none());
    }

    #[test]
    fn test_page() {
        let page: FirewallPolicyPage = serde_json::from_str(
            r#"{"meta": {"next": "/api/2.0/fwpolicies/?offset=1"}, "objects": [{"uuid": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(
            page.meta.unwrap().next_query().as_deref(),
            Some("?offset=1")
        );
    }
}
