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

use cloudsigma::compute::ServerStatus;
use cloudsigma::{ErrorKind, Timeouts};
use mockito::{Matcher, Request, ServerGuard};
use waiter::Waiter;

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

/// Respond with the bodies in turn, repeating the last one.
fn sequence(bodies: Vec<String>) -> impl Fn(&Request) -> Vec<u8> + Send + Sync + 'static {
    let counter = Arc::new(AtomicUsize::new(0));
    move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        bodies[n.min(bodies.len() - 1)].clone().into_bytes()
    }
}

fn server_body(id: &str, status: &str) -> String {
    format!(
        "server {}\nname {}\nstatus {}\nboot ide:0:0\nide:0:0 d-{}\ncpu 1000\nmem 512\nsmp 1\nuser {}\n",
        id, id, status, id, ACCOUNT
    )
}

#[tokio::test]
async fn test_get_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(
            "server s1
name web
status active
boot ide:0:0
ide:0:0 d1
block:2 d2
nic:0:dhcp 31.171.246.10
nic:0:vlan
nic:1:dhcp 10.0.0.5
nic:1:vlan v1
vnc:password s3cret
cpu 2000
mem 1024
smp 2
user 6e5f3b1c-7e74-4b8a-9e0c-6f8e3b4f3f11
",
        )
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/servers/missing/info")
        .with_status(404)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let srv = cloud.get_server("s1").await.expect("Cannot get server");
    assert_eq!(srv.id(), "s1");
    assert_eq!(srv.name(), "web");
    assert_eq!(srv.status(), ServerStatus::Running);
    assert_eq!(srv.image_id().as_deref(), Some("d1"));
    assert_eq!(srv.vlan_id().as_deref(), Some("v1"));
    assert_eq!(srv.device_of("d2"), Some(2));
    assert_eq!(srv.assigned_ip_id().as_deref(), Some("31.171.246.10"));
    assert_eq!(srv.public_addresses(), &vec!["31.171.246.10".to_string()]);
    assert_eq!(srv.private_addresses(), &vec!["10.0.0.5".to_string()]);
    assert_eq!(srv.root_user().as_deref(), Some("root"));
    assert_eq!(srv.product_id(), "1024:2000:2");
    assert_eq!(srv.region_id(), "zrh");
    assert_eq!(srv.data_center_id(), "zrh-a");

    let err = cloud.get_server("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(cloud.find_server("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_server_status() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/servers/info")
        .with_body(format!(
            "{}\n{}\nname without id\n",
            server_body("s1", "active"),
            server_body("s2", "stopped")
        ))
        .create_async()
        .await;

    let cloud = set_up(&server);
    let status = cloud.list_server_status().await.expect("Cannot list servers");
    assert_eq!(
        status,
        vec![
            ("s1".to_string(), ServerStatus::Running),
            ("s2".to_string(), ServerStatus::Stopped),
        ]
    );
}

#[tokio::test]
async fn test_reboot_running_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![
            server_body("s1", "active"),
            server_body("s1", "stopped"),
        ]))
        .create_async()
        .await;
    let shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .expect(1)
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s1/start")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    cloud.reboot_server("s1").await.expect("Cannot reboot");

    shutdown.assert_async().await;
    start.assert_async().await;
}

#[tokio::test]
async fn test_shut_down_forces_stuck_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![server_body("s1", "active")]))
        .create_async()
        .await;
    let shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .expect(1)
        .create_async()
        .await;
    let stop = server
        .mock("GET", "/servers/s1/stop")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    // The server never stops, the last known state is kept.
    let srv = cloud.shut_down_server("s1").await.expect("Cannot stop");
    assert_eq!(srv.status(), ServerStatus::Running);

    shutdown.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn test_terminate_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![
            server_body("s1", "stopped"),
            server_body("s1", "stopped"),
            server_body("s1", "dead"),
        ]))
        .create_async()
        .await;
    let destroy = server
        .mock("GET", "/servers/s1/destroy")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let waiter = cloud.terminate_server("s1").await.expect("Cannot terminate");
    waiter.wait().await.expect("Server was not terminated");

    destroy.assert_async().await;
}

#[tokio::test]
async fn test_change_stopped_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(server_body("s1", "stopped"))
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s1/set")
        .match_body(Matcher::Regex("nic:0:dhcp 31.171.246.10".to_string()))
        .with_body(server_body("s1", "stopped"))
        .expect(1)
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s1/start")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let mut srv = cloud.get_server("s1").await.unwrap();
    let task = srv
        .assign_ip("31.171.246.10")
        .await
        .expect("Cannot assign IP");
    assert!(task.is_none());

    set.assert_async().await;
    start.assert_async().await;
}

#[tokio::test]
async fn test_attach_volume_restarts_server() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nsize 1073741824\nuser {}\n",
            ACCOUNT
        ))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![
            server_body("s1", "active"),
            server_body("s1", "stopped"),
        ]))
        .create_async()
        .await;
    let shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .expect(1)
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s1/set")
        .match_body(Matcher::Regex("block:3 d9".to_string()))
        .with_body(server_body("s1", "stopped"))
        .expect(1)
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s1/start")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let task = cloud
        .attach_volume("d9", "s1", 3)
        .await
        .expect("Cannot attach volume")
        .expect("No restart was scheduled");
    task.join().await.expect("Restart failed");

    shutdown.assert_async().await;
    set.assert_async().await;
    start.assert_async().await;
}

#[tokio::test]
async fn test_attach_volume_twice() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nuser {}\nhost s1\n",
            ACCOUNT
        ))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(format!("{}block:0 d9\n", server_body("s1", "stopped")))
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s1/set")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let volume = cloud.get_volume("d9").await.unwrap();
    assert_eq!(volume.server_id(), Some("s1"));
    assert_eq!(volume.device_id(), Some(0));

    let err = cloud.attach_volume("d9", "s1", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = cloud.attach_volume("d9", "s1", 8).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    set.assert_async().await;
}

#[tokio::test]
async fn test_clone_running_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![
            server_body("s1", "active"),
            server_body("s1", "stopped"),
        ]))
        .create_async()
        .await;
    let _shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .create_async()
        .await;
    let clone = server
        .mock("POST", "/servers/s1/clone")
        .match_body(Matcher::Regex("name copy".to_string()))
        .with_body(server_body("s2", "stopped"))
        .expect(1)
        .create_async()
        .await;
    let start_source = server
        .mock("GET", "/servers/s1/start")
        .expect(1)
        .create_async()
        .await;
    let start_clone = server
        .mock("GET", "/servers/s2/start")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let provisioned = cloud
        .clone_server("s1", "copy", true)
        .await
        .expect("Cannot clone");
    assert_eq!(provisioned.server.id(), "s2");
    assert_eq!(provisioned.background.len(), 2);
    for task in provisioned.background {
        task.join().await.expect("Background start failed");
    }

    clone.assert_async().await;
    start_source.assert_async().await;
    start_clone.assert_async().await;
}

#[tokio::test]
async fn test_clone_failure_restarts_source() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body_from_request(sequence(vec![
            server_body("s1", "active"),
            server_body("s1", "stopped"),
        ]))
        .create_async()
        .await;
    let _shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .create_async()
        .await;
    let _clone = server
        .mock("POST", "/servers/s1/clone")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let start_source = server
        .mock("GET", "/servers/s1/start")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud.clone_server("s1", "copy", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalServerError);

    // The restart is detached, give it a chance to run.
    for _ in 0..50 {
        if start_source.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    start_source.assert_async().await;
}

#[tokio::test]
async fn test_launch_server() {
    let mut server = mockito::Server::new_async().await;
    let _image = server
        .mock("GET", "/drives/img1/info")
        .with_body(
            "drive img1
name Ubuntu 22.04
status active
size 10737418240
user 00000000-0000-0000-0000-000000000001
",
        )
        .create_async()
        .await;
    let clone = server
        .mock("POST", "/drives/img1/clone")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name web-1".to_string()),
            Matcher::Regex("size 10737418240".to_string()),
            Matcher::Regex("claim:type exclusive".to_string()),
        ]))
        .with_body("drive d2\nname web-1\nstatus copying\n")
        .expect(1)
        .create_async()
        .await;
    let _drive = server
        .mock("GET", "/drives/d2/info")
        .with_body_from_request(sequence(vec![
            "drive d2\nstatus copying\n".to_string(),
            "drive d2\nstatus active\n".to_string(),
        ]))
        .create_async()
        .await;
    let create = server
        .mock("POST", "/servers/create")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name web-1".to_string()),
            Matcher::Regex("ide:0:0 d2".to_string()),
            Matcher::Regex("boot ide:0:0".to_string()),
            Matcher::Regex("cpu 2000".to_string()),
            Matcher::Regex("mem 2048".to_string()),
            Matcher::Regex("smp 2".to_string()),
            Matcher::Regex("nic:1:vlan v1".to_string()),
        ]))
        .with_body(server_body("s3", "stopped"))
        .expect(1)
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s3/info")
        .with_body(server_body("s3", "stopped"))
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s3/start")
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let provisioned = cloud
        .new_server("web-1", "img1")
        .with_product_id("2048:2000:2")
        .with_vlan_id("v1")
        .launch()
        .await
        .expect("Cannot launch");
    assert_eq!(provisioned.server.id(), "s3");
    assert_eq!(provisioned.background.len(), 1);
    for task in provisioned.background {
        task.join().await.expect("Background start failed");
    }

    clone.assert_async().await;
    create.assert_async().await;
    start.assert_async().await;
}

#[tokio::test]
async fn test_launch_missing_image() {
    let mut server = mockito::Server::new_async().await;
    let _own = server
        .mock("GET", "/drives/nope/info")
        .with_status(404)
        .create_async()
        .await;
    let _library = server
        .mock("GET", "/drives/standard/img/nope/info")
        .with_status(404)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud
        .new_server("web-1", "nope")
        .launch()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}

#[tokio::test]
async fn test_test_context() {
    let mut server = mockito::Server::new_async().await;
    let _profile = server
        .mock("GET", "/profile/")
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"uuid": "{}", "email": "me@example.com"}}"#, ACCOUNT))
        .create_async()
        .await;

    let cloud = set_up(&server);
    assert_eq!(cloud.test_context().await.as_deref(), Some(ACCOUNT));
}

#[tokio::test]
async fn test_test_context_bad_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _profile = server
        .mock("GET", "/profile/")
        .with_status(401)
        .create_async()
        .await;

    let cloud = set_up(&server);
    assert!(cloud.test_context().await.is_none());
}

#[tokio::test]
async fn test_attach_volume_occupied_device() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nuser {}\n",
            ACCOUNT
        ))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(format!("{}block:3 d5\n", server_body("s1", "active")))
        .create_async()
        .await;
    let shutdown = server
        .mock("GET", "/servers/s1/shutdown")
        .expect(0)
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s1/set")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud.attach_volume("d9", "s1", 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    shutdown.assert_async().await;
    set.assert_async().await;
}

#[tokio::test]
async fn test_attach_volume_attached_elsewhere() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nuser {}\nhost s2\n",
            ACCOUNT
        ))
        .create_async()
        .await;
    let _other = server
        .mock("GET", "/servers/s2/info")
        .with_body(format!("{}block:1 d9\n", server_body("s2", "stopped")))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(server_body("s1", "stopped"))
        .create_async()
        .await;
    let set = server
        .mock("POST", Matcher::Regex("^/servers/s[12]/set$".to_string()))
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud.attach_volume("d9", "s1", 2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    set.assert_async().await;
}

#[tokio::test]
async fn test_detach_volume() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nuser {}\nhost s1\n",
            ACCOUNT
        ))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(format!("{}block:2 d9\n", server_body("s1", "stopped")))
        .create_async()
        .await;
    let set = server
        .mock("POST", "/servers/s1/set")
        .match_body(Matcher::Regex("block:2".to_string()))
        .with_body(server_body("s1", "stopped"))
        .expect(1)
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s1/start")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let task = cloud.detach_volume("d9").await.expect("Cannot detach volume");
    assert!(task.is_none());

    set.assert_async().await;
    start.assert_async().await;
}

#[tokio::test]
async fn test_detach_volume_not_attached() {
    let mut server = mockito::Server::new_async().await;
    let _drive = server
        .mock("GET", "/drives/d9/info")
        .with_body(format!(
            "drive d9\nname data\nstatus active\nuser {}\n",
            ACCOUNT
        ))
        .create_async()
        .await;

    let cloud = set_up(&server);
    let mut volume = cloud.get_volume("d9").await.unwrap();
    let err = volume.detach().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_clone_terminated_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(server_body("s1", "dead"))
        .create_async()
        .await;
    let clone = server
        .mock("POST", "/servers/s1/clone")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud.clone_server("s1", "copy", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    clone.assert_async().await;
}

#[tokio::test]
async fn test_launch_drive_disappears() {
    let mut server = mockito::Server::new_async().await;
    let _image = server
        .mock("GET", "/drives/img1/info")
        .with_body("drive img1\nname Ubuntu 22.04\nstatus active\nsize 10737418240\n")
        .create_async()
        .await;
    let _clone = server
        .mock("POST", "/drives/img1/clone")
        .with_body("drive d2\nname web-1\nstatus copying\n")
        .create_async()
        .await;
    let _own = server
        .mock("GET", "/drives/d2/info")
        .with_status(404)
        .create_async()
        .await;
    let _library = server
        .mock("GET", "/drives/standard/img/d2/info")
        .with_status(404)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/servers/create")
        .expect(0)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud
        .new_server("web-1", "img1")
        .launch()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationFailed);

    create.assert_async().await;
}

#[tokio::test]
async fn test_server_data_center_exists() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(server_body("s1", "active"))
        .create_async()
        .await;

    let cloud = set_up(&server);
    let srv = cloud.get_server("s1").await.unwrap();
    let dc = cloud
        .get_data_center(srv.data_center_id())
        .expect("Cannot look up data center")
        .expect("Data center of the server is unknown");
    assert_eq!(&dc.region_id, srv.region_id());
    assert_eq!(cloud.list_data_centers(srv.region_id()).unwrap(), vec![dc]);
    assert!(cloud.list_data_centers("nowhere").unwrap().is_empty());
}

#[tokio::test]
async fn test_start_action_on_missing_server() {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/servers/s1/info")
        .with_body(server_body("s1", "stopped"))
        .create_async()
        .await;
    let start = server
        .mock("GET", "/servers/s1/start")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let cloud = set_up(&server);
    let err = cloud.start_server("s1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

    start.assert_async().await;
}
