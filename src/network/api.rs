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

//! Foundation bits exposing the networking APIs.

use async_stream::try_stream;
use futures::stream::Stream;

use super::super::common::KvBody;
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::{self, FirewallPolicy, Resource};

fn check_firewall_id(id: &str) -> Result<()> {
    if id.is_empty() {
        Err(Error::new(
            ErrorKind::InvalidInput,
            "Firewall ID must not be empty",
        ))
    } else {
        Ok(())
    }
}

/// Get a network resource of the given type, `None` if it does not exist.
pub async fn get_resource<S: AsRef<str>>(
    session: &Session,
    resource_type: &str,
    id: S,
) -> Result<Option<Resource>> {
    trace!("Fetching {} {}", resource_type, id.as_ref());
    let result = session
        .get_kv(&["resources", resource_type, id.as_ref(), "info"])
        .await?
        .and_then(|obj| Resource::from_kv(&obj));
    trace!("Received {:?}", result);
    Ok(result)
}

/// List network resources of the given type.
pub async fn list_resources(session: &Session, resource_type: &str) -> Result<Vec<Resource>> {
    trace!("Listing {} resources", resource_type);
    let result: Vec<Resource> = session
        .get_kv_list(&["resources", resource_type, "info"])
        .await?
        .iter()
        .filter_map(Resource::from_kv)
        .collect();
    trace!("Received {} resources: {:?}", resource_type, result);
    Ok(result)
}

/// Create a network resource of the given type.
pub async fn create_resource(
    session: &Session,
    resource_type: &str,
    body: KvBody,
) -> Result<Resource> {
    trace!("Creating {} with {:?}", resource_type, body);
    let result = session
        .post_kv(&["resources", resource_type, "create"], body)
        .await?
        .as_ref()
        .and_then(Resource::from_kv)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("No {} information was returned on creation", resource_type),
            )
        })?;
    debug!("Created {} {}", resource_type, result.id);
    Ok(result)
}

/// Destroy a network resource of the given type.
pub async fn destroy_resource<S: AsRef<str>>(
    session: &Session,
    resource_type: &str,
    id: S,
) -> Result<()> {
    trace!("Destroying {} {}", resource_type, id.as_ref());
    let segments = ["resources", resource_type, id.as_ref(), "destroy"];
    // IPs are released with GET, VLANs with POST
    if resource_type == "ip" {
        session.get_action(&segments).await?;
    } else {
        session.post_action(&segments).await?;
    }
    debug!("Successfully destroyed {} {}", resource_type, id.as_ref());
    Ok(())
}

/// Get a firewall policy, `None` if it does not exist.
pub async fn get_firewall<S: AsRef<str>>(
    session: &Session,
    id: S,
) -> Result<Option<FirewallPolicy>> {
    let id = id.as_ref();
    check_firewall_id(id)?;
    trace!("Fetching firewall policy {}", id);
    let result = session.get_json(&["fwpolicies", id, ""], None).await?;
    trace!("Received {:?}", result);
    Ok(result)
}

/// Create a firewall policy.
pub async fn create_firewall<S: Into<String>>(session: &Session, name: S) -> Result<FirewallPolicy> {
    let body = protocol::CreateRequest {
        objects: vec![protocol::NamedObject { name: name.into() }],
    };
    trace!("Creating firewall policy with {:?}", body);
    let page: protocol::FirewallPolicyPage =
        session.post_json(&["fwpolicies", ""], &body).await?;
    let result = page.objects.into_iter().next().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidResponse,
            "Firewall created but no information was provided",
        )
    })?;
    debug!("Created firewall policy {}", result.uuid);
    Ok(result)
}

/// Replace a firewall policy.
pub async fn update_firewall(session: &Session, policy: &FirewallPolicy) -> Result<FirewallPolicy> {
    check_firewall_id(&policy.uuid)?;
    trace!("Updating firewall policy {:?}", policy);
    let result: FirewallPolicy = session
        .put_json(&["fwpolicies", &policy.uuid, ""], policy)
        .await?;
    debug!("Updated firewall policy {}", result.uuid);
    Ok(result)
}

/// List firewall policies page by page.
///
/// `detail` requests full policies with their rules.
pub fn list_firewalls(
    session: Session,
    detail: bool,
) -> impl Stream<Item = Result<FirewallPolicy>> {
    try_stream! {
        let mut query: Option<String> = None;
        loop {
            let segments: &[&str] = if detail {
                &["fwpolicies", "detail", ""]
            } else {
                &["fwpolicies", ""]
            };
            trace!("Fetching firewall policies with query {:?}", query);
            let page: protocol::FirewallPolicyPage = session
                .get_json(segments, query.as_deref())
                .await?
                .ok_or_else(|| Error::new(ErrorKind::ResourceNotFound, "No firewall endpoint was found"))?;

            for policy in page.objects {
                yield policy;
            }

            query = page.meta.and_then(|meta| meta.next_query());
            if query.is_none() {
                break;
            }
        }
    }
}
