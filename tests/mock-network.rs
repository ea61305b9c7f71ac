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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use cloudsigma::network::{
    AddressType, Direction, FirewallRule, IpVersion, Permission, Protocol, RuleTarget, VlanState,
};
use cloudsigma::{ErrorKind, Timeouts};
use futures::stream::TryStreamExt;
use mockito::{Matcher, Request, ServerGuard};
use serde_json::json;

static INIT: Once = Once::new();

const ACCOUNT: &str = "6e5f3b1c-7e74-4b8a-9e0c-6f8e3b4f3f11";

fn set_up(server: &ServerGuard) -> cloudsigma::Cloud {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    let ms = Duration::from_millis;
    let auth = cloudsigma::auth::BasicAuth::new(server.url(), "me@example.com", "secret")
        .expect("Invalid endpoint");
    let mut session = cloudsigma::Session::new(auth);
    session.set_region("zrh");
    session.set_account(ACCOUNT);
    session.set_timeouts(Timeouts {
        poll_interval: ms(10),
        clone_poll_interval: ms(10),
        drive_poll_interval: ms(10),
        graceful_shutdown: ms(500),
        change_stop: ms(500),
        clone_stop: ms(500),
        reboot_stop: ms(500),
        server_ready: ms(500),
        drive_ready: ms(500),
        terminate: ms(500),
        start_attempts: 3,
        start_retry_delay: ms(10),
    });
    cloudsigma::Cloud::from_session(session)
}

fn sequence(bodies: Vec<String>) -> impl Fn(&Request) -> Vec<u8> + Send + Sync + 'static {
    let counter = Arc::new(AtomicUsize::new(0));
    move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        bodies[n.min(bodies.len() - 1)].clone().into_bytes()
    }
}

fn servers_body() -> String {
    format!(
        "server s1
name web
status stopped
nic:0:dhcp 31.171.246.10
nic:1:vlan v1
user {account}

server s2
name db
status active
user {account}
",
        account = ACCOUNT
    )
}

fn resources_body(resource_type: &str) -> String {
    match resource_type {
        "vlan" => format!(
            "resource v1\nname backend\ntype vlan\nuser {}\n\n\
             resource v2\nname theirs\ntype vlan\nuser 11111111-2222-3333-4444-555555555555\n\n\
             resource 31.171.246.10\ntype ip\nuser {}\n",
            ACCOUNT, ACCOUNT
        ),
        _ => format!(
            "resource 31.171.246.10\ntype ip\nuser {}\n\n\
             resource 31.171.246.11\ntype ip\nuser {}\n",
            ACCOUNT, ACCOUNT
        ),
    }
}

#[tokio::test]
async fn test_vlans() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/resources/vlan/info")
        .with_body(resources_body("vlan"))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/resources/vlan/v1/info")
        .with_body(format!("resource v1\nname backend\ntype vlan\nuser {}\n", ACCOUNT))
        .create_async()
        .await;
    let _foreign = server
        .mock("GET", "/resources/vlan/v2/info")
        .with_body("resource v2\ntype vlan\nuser 11111111-2222-3333-4444-555555555555\n")
        .create_async()
        .await;
    let _servers = server
        .mock("GET", "/servers/info")
        .with_body(servers_body())
        .create_async()
        .await;
    let _ips = server
        .mock("GET", "/resources/ip/info")
        .with_body(resources_body("ip"))
        .create_async()
        .await;

    let cloud = set_up(&server);
    let status = cloud.list_vlan_status().await.expect("Cannot list VLANs");
    assert_eq!(status, vec![("v1".to_string(), VlanState::Available)]);

    let vlan = cloud.get_vlan("v1").await.expect("Cannot get VLAN");
    assert_eq!(vlan.name(), "backend");
    assert_eq!(vlan.cidr(), "0.0.0.0/0");
    assert_eq!(vlan.owner(), ACCOUNT);
    assert_eq!(vlan.supported_traffic(), vec![IpVersion::V4]);
    assert_eq!(vlan.data_center_id(), "zrh-a");

    let err = cloud.get_vlan("v2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

    let resources = cloud
        .list_vlan_resources("v1")
        .await
        .expect("Cannot list VLAN resources");
    let servers: Vec<&str> = resources.servers.iter().map(|s| s.id().as_str()).collect();
    assert_eq!(servers, vec!["s1"]);
    let ips: Vec<&str> = resources.ips.iter().map(|ip| ip.address()).collect();
    assert_eq!(ips, vec!["31.171.246.10"]);
}

#[tokio::test]
async fn test_create_vlan() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/resources/vlan/create")
        .match_body(Matcher::Regex("name frontend".to_string()))
        .with_body(format!("resource v3\nname frontend\ntype vlan\nuser {}\n", ACCOUNT))
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let vlan = cloud.create_vlan("frontend").await.expect("Cannot create VLAN");
    assert_eq!(vlan.id(), "v3");
    assert_eq!(vlan.state(), VlanState::Available);

    create.assert_async().await;
}

#[tokio::test]
async fn test_ips() {
    let mut server = mockito::Server::new_async().await;
    let _ips = server
        .mock("GET", "/resources/ip/info")
        .with_body(resources_body("ip"))
        .create_async()
        .await;
    let _servers = server
        .mock("GET", "/servers/info")
        .with_body(servers_body())
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/resources/ip/31.171.246.11/info")
        .with_body(format!("resource 31.171.246.11\ntype ip\nuser {}\n", ACCOUNT))
        .create_async()
        .await;
    let destroy = server
        .mock("GET", "/resources/ip/31.171.246.11/destroy")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let all = cloud.list_ips(false).await.expect("Cannot list IPs");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].server_id(), Some("s1"));
    assert_eq!(all[0].address_type(), AddressType::Public);

    let free = cloud.list_ips(true).await.expect("Cannot list IPs");
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id(), "31.171.246.11");
    assert_eq!(free[0].server_id(), None);

    let err = cloud.release_ip_from_server("31.171.246.11").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let _waiter = cloud
        .release_ip_from_pool("31.171.246.11")
        .await
        .expect("Cannot release IP");
    destroy.assert_async().await;
}

#[tokio::test]
async fn test_assign_ip() {
    let mut server = mockito::Server::new_async().await;
    let _servers = server
        .mock("GET", "/servers/info")
        .with_body(servers_body())
        .create_async()
        .await;
    let _ip = server
        .mock("GET", "/resources/ip/31.171.246.11/info")
        .with_body(format!("resource 31.171.246.11\ntype ip\nuser {}\n", ACCOUNT))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s3/info")
        .with_body(format!("server s3\nname new\nstatus stopped\nuser {}\n", ACCOUNT))
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s3/set")
        .match_body(Matcher::Regex("nic:0:dhcp 31.171.246.11".to_string()))
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let task = cloud
        .assign_ip("31.171.246.11", "s3")
        .await
        .expect("Cannot assign IP");
    assert!(task.is_none());

    set.assert_async().await;
}

fn policy(uuid: &str, rules: serde_json::Value) -> serde_json::Value {
    json!({
        "uuid": uuid,
        "name": format!("policy {}", uuid),
        "resource_uri": format!("/api/2.0/fwpolicies/{}/", uuid),
        "servers": [],
        "rules": rules,
    })
}

fn ssh_rule() -> serde_json::Value {
    json!({
        "action": "accept",
        "direction": "in",
        "ip_proto": "tcp",
        "src_ip": "10.0.0.0/8",
        "dst_ip": "",
        "dst_port": "22",
        "comment": "ssh"
    })
}

#[tokio::test]
async fn test_list_firewalls_paginated() {
    let mut server = mockito::Server::new_async().await;
    let pages = vec![
        json!({
            "meta": {"limit": 1, "offset": 0, "total_count": 2,
                     "next": "/api/2.0/fwpolicies/detail/?limit=1&offset=1"},
            "objects": [policy("fw1", json!([ssh_rule()]))]
        })
        .to_string(),
        json!({
            "meta": {"limit": 1, "offset": 1, "total_count": 2, "next": null},
            "objects": [policy("fw2", json!([]))]
        })
        .to_string(),
    ];
    let list = server
        .mock("GET", Matcher::Regex("^/fwpolicies/detail/".to_string()))
        .with_header("content-type", "application/json")
        .with_body_from_request(sequence(pages))
        .expect(2)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let firewalls = cloud.list_firewalls().await.expect("Cannot list firewalls");
    let ids: Vec<&str> = firewalls.iter().map(|f| f.id()).collect();
    assert_eq!(ids, vec!["fw1", "fw2"]);

    let rules = firewalls[0].rules().expect("Invalid rules");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].source, RuleTarget::Cidr("10.0.0.0/8".to_string()));
    assert_eq!(rules[0].destination, RuleTarget::Global("fw1".to_string()));
    assert_eq!(rules[0].ports, Some((22, 22)));

    list.assert_async().await;
}

#[tokio::test]
async fn test_firewall_stream() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", Matcher::Regex("^/fwpolicies/detail/".to_string()))
        .with_header("content-type", "application/json")
        .with_body(json!({"meta": {"next": null}, "objects": [policy("fw1", json!([]))]}).to_string())
        .create_async()
        .await;

    let cloud = set_up(&server);
    let names: Vec<String> = cloud
        .stream_firewalls()
        .map_ok(|fw| fw.name().to_string())
        .try_collect()
        .await
        .expect("Cannot stream firewalls");
    assert_eq!(names, vec!["policy fw1".to_string()]);
}

#[tokio::test]
async fn test_create_firewall() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/fwpolicies/")
        .match_body(Matcher::Json(json!({"objects": [{"name": "web"}]})))
        .with_header("content-type", "application/json")
        .with_body(json!({"objects": [policy("fw9", json!([]))]}).to_string())
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let firewall = cloud.create_firewall("web").await.expect("Cannot create firewall");
    assert_eq!(firewall.id(), "fw9");
    assert!(firewall.is_active());

    create.assert_async().await;

    let err = cloud.get_firewall("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_authorize_keeps_unknown_fields() {
    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", "/fwpolicies/fw1/")
        .with_header("content-type", "application/json")
        .with_body(policy("fw1", json!([ssh_rule()])).to_string())
        .create_async()
        .await;
    let http_rule = json!({
        "action": "accept",
        "direction": "in",
        "ip_proto": "tcp",
        "dst_port": "80:81"
    });
    let put = server
        .mock("PUT", "/fwpolicies/fw1/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "uuid": "fw1",
                "resource_uri": "/api/2.0/fwpolicies/fw1/",
            })),
            Matcher::Regex(r#""comment":"ssh""#.to_string()),
            Matcher::Regex(r#""dst_port":"80:81""#.to_string()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(policy("fw1", json!([ssh_rule(), http_rule])).to_string())
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let rule = FirewallRule::new("fw1", Direction::Ingress, Permission::Allow, Protocol::Tcp)
        .with_ports(80, 81);
    let id = cloud.authorize(rule).await.expect("Cannot authorize");
    assert_eq!(id, "fw1:global:fw1:in:tcp:accept:global:fw1:80:81");

    put.assert_async().await;
}

#[tokio::test]
async fn test_revoke_by_id() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", Matcher::Regex("^/fwpolicies/detail/".to_string()))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "meta": {"next": null},
                "objects": [policy("fw1", json!([])), policy("fw2", json!([ssh_rule()]))]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/fwpolicies/fw2/")
        .with_header("content-type", "application/json")
        .with_body(policy("fw2", json!([ssh_rule()])).to_string())
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/fwpolicies/fw2/")
        .match_body(Matcher::PartialJson(json!({"uuid": "fw2", "rules": []})))
        .with_header("content-type", "application/json")
        .with_body(policy("fw2", json!([])).to_string())
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let rule_id = "fw2:cidr:10.0.0.0/8:in:tcp:accept:global:fw2:22:22";
    let rules = cloud.get_rules("fw2").await.expect("Cannot get rules");
    assert_eq!(rules[0].id(), rule_id);

    cloud.revoke_by_id(rule_id).await.expect("Cannot revoke");
    put.assert_async().await;

    let err = cloud.revoke_by_id("fw1:unknown").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}
