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

//! Static IP management.

use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use super::super::common::{DeletionWaiter, KvBody, Refresh};
use super::super::compute::{BackgroundTask, Server};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::Resource;
use super::{api, AddressType, IpVersion};

const RESOURCE_TYPE: &str = "ip";

/// Structure representing a single static IP.
#[derive(Clone, Debug)]
pub struct IpAddress {
    session: Session,
    inner: Resource,
    region_id: String,
    server_id: Option<String>,
}

impl Display for IpAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.id)
    }
}

fn holder(servers: &[Server], ip: &str) -> Option<String> {
    servers
        .iter()
        .find(|server| server.assigned_ip_id().as_deref() == Some(ip))
        .map(|server| server.id().clone())
}

impl IpAddress {
    fn new(session: &Session, inner: Resource, servers: &[Server]) -> Result<IpAddress> {
        Ok(IpAddress {
            region_id: session.region_id()?,
            server_id: holder(servers, &inner.id),
            session: session.clone(),
            inner,
        })
    }

    /// Request a new static IP.
    pub(crate) async fn request(session: &Session) -> Result<IpAddress> {
        let inner = api::create_resource(session, RESOURCE_TYPE, KvBody::new()).await?;
        IpAddress::new(session, inner, &[])
    }

    /// Load an IP, `None` if it does not exist or belongs to someone else.
    pub(crate) async fn find<Id: AsRef<str>>(
        session: &Session,
        id: Id,
    ) -> Result<Option<IpAddress>> {
        let account = session.account().await?;
        match api::get_resource(session, RESOURCE_TYPE, id).await? {
            Some(inner) if inner.is_usable(RESOURCE_TYPE, &account) => {
                let servers = Server::list(session).await?;
                Ok(Some(IpAddress::new(session, inner, &servers)?))
            }
            _ => Ok(None),
        }
    }

    /// Load an IP.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<IpAddress> {
        let id = id.as_ref();
        IpAddress::find(session, id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such IP address: {}", id),
            )
        })
    }

    /// List static IPs of the account.
    pub(crate) async fn list(session: &Session, unassigned_only: bool) -> Result<Vec<IpAddress>> {
        let account = session.account().await?;
        let resources = api::list_resources(session, RESOURCE_TYPE).await?;
        let servers = Server::list(session).await?;
        let mut result = Vec::new();
        for inner in resources {
            if !inner.is_usable(RESOURCE_TYPE, &account) {
                continue;
            }
            let ip = IpAddress::new(session, inner, &servers)?;
            if unassigned_only && ip.server_id.is_some() {
                continue;
            }
            result.push(ip);
        }
        Ok(result)
    }

    transparent_property! {
        #[doc = "IP unique ID, same as the address."]
        id: ref String
    }

    /// The address itself.
    pub fn address(&self) -> &str {
        &self.inner.id
    }

    /// Address type, static IPs are always public.
    pub fn address_type(&self) -> AddressType {
        AddressType::Public
    }

    /// IP version.
    pub fn version(&self) -> IpVersion {
        IpVersion::V4
    }

    /// ID of the server holding the IP.
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    /// ID of the region.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Assign the IP to a server.
    ///
    /// The server is stopped for the change and restarted in the background
    /// if it was running.
    pub async fn assign<S: AsRef<str>>(
        &mut self,
        server_id: S,
    ) -> Result<Option<BackgroundTask<()>>> {
        let mut server = Server::load(&self.session, server_id).await?;
        let task = server.assign_ip(&self.inner.id).await?;
        self.server_id = Some(server.id().clone());
        Ok(task)
    }

    /// Release the IP from the server holding it.
    pub async fn release_from_server(&mut self) -> Result<Option<BackgroundTask<()>>> {
        let server_id = self.server_id.clone().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("IP address {} is not assigned to a server", self.inner.id),
            )
        })?;
        let mut server = Server::load(&self.session, server_id).await?;
        let task = server.release_ip().await?;
        self.server_id = None;
        Ok(task)
    }

    /// Release the IP back to the pool.
    pub async fn release_from_pool(self) -> Result<DeletionWaiter<IpAddress>> {
        api::destroy_resource(&self.session, RESOURCE_TYPE, &self.inner.id).await?;
        let timeouts = *self.session.timeouts();
        Ok(DeletionWaiter::new(
            self,
            timeouts.terminate,
            timeouts.poll_interval,
        ))
    }
}

#[async_trait]
impl Refresh for IpAddress {
    /// Refresh the IP.
    async fn refresh(&mut self) -> Result<()> {
        *self = IpAddress::load(&self.session, &self.inner.id).await?;
        Ok(())
    }
}
